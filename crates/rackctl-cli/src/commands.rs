//! Subcommand handlers.
//!
//! Each handler works on an opened [`Config`] and writes its report to `out`.

use std::io::Write;

use anyhow::{Context as _, Result};
use rackctl_control::{AuthInfoOptions, ClusterOptions, ClusterType, Config, ContextOptions};
use rackctl_store::Store;

use crate::args::{
    ClusterCommand, Command, ConfigCommand, OutputFormat, SetClusterArgs, SetContextArgs,
    SetCredentialsArgs,
};

/// Run one command against the store, persisting any change it made.
pub fn run<S: Store>(command: Command, store: &S, out: &mut dyn Write) -> Result<()> {
    if matches!(command, Command::Config(ConfigCommand::Purge)) {
        Config::new().purge(store)?;
        writeln!(out, "Removed profile {}", store.location())?;
        return Ok(());
    }

    let mut config = Config::open(store)?;
    match command {
        Command::Config(command) => config_command(&mut config, command, out)?,
        Command::Cluster(command) => cluster_command(&config, command, out)?,
    }

    if config.persist_if_dirty(store)? {
        tracing::debug!(location = %store.location(), "Saved configuration");
    }
    Ok(())
}

fn config_command(config: &mut Config, command: ConfigCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        ConfigCommand::GetCluster { name, cluster_type } => {
            get_cluster(config, name.as_deref(), cluster_type, out)
        }
        ConfigCommand::SetCluster(args) => set_cluster(config, args, out),
        ConfigCommand::GetContext { name, current } => {
            get_context(config, name.as_deref(), current, out)
        }
        ConfigCommand::SetContext(args) => set_context(config, args, out),
        ConfigCommand::UseContext { name } => {
            config.use_context(&name)?;
            writeln!(out, "Switched to context \"{name}\".")?;
            Ok(())
        }
        ConfigCommand::GetCredentials { name } => get_credentials(config, name.as_deref(), out),
        ConfigCommand::SetCredentials(args) => set_credentials(config, args, out),
        ConfigCommand::View { output } => view(config, output, out),
        // Handled before the configuration is opened.
        ConfigCommand::Purge => Ok(()),
    }
}

fn cluster_command(config: &Config, command: ClusterCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        ClusterCommand::Entrypoint {
            cluster_type,
            phase,
        } => {
            let path = config.current_context_entry_point(cluster_type, &phase)?;
            writeln!(out, "{}", path.display())?;
            Ok(())
        }
    }
}

fn get_cluster(
    config: &Config,
    name: Option<&str>,
    cluster_type: Option<ClusterType>,
    out: &mut dyn Write,
) -> Result<()> {
    if let (Some(name), Some(cluster_type)) = (name, cluster_type) {
        let cluster = config.get_cluster(name, cluster_type)?;
        write!(out, "{}", cluster.describe())?;
        return Ok(());
    }

    let clusters: Vec<_> = config
        .clusters()
        .into_iter()
        .filter(|c| {
            let id = c.identity();
            name.is_none_or(|n| id.name() == n)
                && cluster_type.is_none_or(|t| id.cluster_type() == t)
        })
        .collect();
    if clusters.is_empty() {
        writeln!(out, "No clusters found in the configuration.")?;
    }
    for cluster in clusters {
        writeln!(out, "{}", cluster.describe())?;
    }
    Ok(())
}

fn set_cluster(config: &mut Config, args: SetClusterArgs, out: &mut dyn Write) -> Result<()> {
    let options = ClusterOptions {
        server: args.server,
        insecure_skip_tls_verify: args.insecure_skip_tls_verify,
        certificate_authority: args.certificate_authority,
        embed_ca_data: args.embed_certs,
        bootstrap_info: args.bootstrap_info,
        management_configuration: args.management_config,
        ..ClusterOptions::new(args.name, args.cluster_type)
    };
    let created = config.set_cluster(&options)?;
    writeln!(
        out,
        "Cluster \"{}\" of type \"{}\" {}.",
        options.name,
        options.cluster_type,
        outcome(created)
    )?;
    Ok(())
}

fn get_context(
    config: &Config,
    name: Option<&str>,
    current: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if current {
        let context = config.current_context()?;
        write!(out, "{}", context.describe())?;
        return Ok(());
    }
    if let Some(name) = name {
        write!(out, "{}", config.get_context(name)?.describe())?;
        return Ok(());
    }

    let contexts = config.contexts();
    if contexts.is_empty() {
        writeln!(out, "No contexts found in the configuration.")?;
    }
    for context in contexts {
        writeln!(out, "{}", context.describe())?;
    }
    Ok(())
}

fn set_context(config: &mut Config, args: SetContextArgs, out: &mut dyn Write) -> Result<()> {
    let options = ContextOptions {
        name: args.name,
        current: args.current,
        cluster: args.cluster,
        cluster_type: args.cluster_type.map(|t| t.to_string()),
        auth_info: args.user,
        manifest: args.manifest,
        namespace: args.namespace,
    };
    let name = config.resolve_context_name(&options)?;
    let created = config.set_context(&options)?;
    writeln!(out, "Context \"{name}\" {}.", outcome(created))?;
    Ok(())
}

fn get_credentials(config: &Config, name: Option<&str>, out: &mut dyn Write) -> Result<()> {
    if let Some(name) = name {
        write!(out, "{}", config.get_auth_info(name)?.describe())?;
        return Ok(());
    }

    let auth_infos = config.auth_infos();
    if auth_infos.is_empty() {
        writeln!(out, "No User credentials found in the configuration.")?;
    }
    for auth_info in auth_infos {
        writeln!(out, "{}", auth_info.describe())?;
    }
    Ok(())
}

fn set_credentials(
    config: &mut Config,
    args: SetCredentialsArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let options = AuthInfoOptions {
        client_certificate: args.client_certificate,
        client_key: args.client_key,
        token: args.token,
        username: args.username,
        password: args.password,
        embed_cert_data: args.embed_certs,
        ..AuthInfoOptions::named(args.name)
    };
    let created = config.set_auth_info(&options)?;
    writeln!(
        out,
        "User information \"{}\" {}.",
        options.name,
        outcome(created)
    )?;
    Ok(())
}

fn view(config: &Config, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Yaml => write!(out, "{}", config.to_yaml_string())?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(config.profile())
                .context("failed to render profile as JSON")?;
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

const fn outcome(created: bool) -> &'static str {
    if created {
        "created"
    } else {
        "modified"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rackctl_control::ConfigError;
    use rackctl_store::FileStore;
    use tempfile::TempDir;

    use crate::args::Cli;

    fn setup() -> (FileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (FileStore::in_dir(dir.path()), dir)
    }

    fn exec(store: &FileStore, argv: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("rackctl").chain(argv.iter().copied()))?;
        let mut out = Vec::new();
        run(cli.command, store, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn set_cluster_created_then_modified() {
        let (store, _dir) = setup();

        let out = exec(
            &store,
            &["config", "set-cluster", "lab", "--cluster-type", "ephemeral", "--server", "https://10.0.0.1:6443"],
        )
        .unwrap();
        assert_eq!(out, "Cluster \"lab\" of type \"ephemeral\" created.\n");

        let out = exec(
            &store,
            &["config", "set-cluster", "lab", "--cluster-type", "ephemeral", "--insecure-skip-tls-verify"],
        )
        .unwrap();
        assert_eq!(out, "Cluster \"lab\" of type \"ephemeral\" modified.\n");

        let out = exec(&store, &["config", "get-cluster", "lab", "--cluster-type", "ephemeral"]).unwrap();
        assert!(out.contains("lab_ephemeral"));
        assert!(out.contains("https://10.0.0.1:6443"));
    }

    #[test]
    fn get_cluster_filters_by_name() {
        let (store, _dir) = setup();
        exec(&store, &["config", "set-cluster", "lab", "--cluster-type", "ephemeral"]).unwrap();
        exec(&store, &["config", "set-cluster", "lab", "--cluster-type", "target"]).unwrap();
        exec(&store, &["config", "set-cluster", "edge", "--cluster-type", "target"]).unwrap();

        let out = exec(&store, &["config", "get-cluster", "lab"]).unwrap();
        assert!(out.contains("lab_ephemeral"));
        assert!(out.contains("lab_target"));
        assert!(!out.contains("edge_target"));

        let out = exec(&store, &["config", "get-cluster", "nope"]).unwrap();
        assert_eq!(out, "No clusters found in the configuration.\n");
    }

    #[test]
    fn set_context_and_switch() {
        let (store, _dir) = setup();
        exec(&store, &["config", "set-cluster", "lab", "--cluster-type", "ephemeral"]).unwrap();

        let out = exec(
            &store,
            &["config", "set-context", "boot", "--cluster", "lab", "--cluster-type", "ephemeral", "--user", "admin"],
        )
        .unwrap();
        assert_eq!(out, "Context \"boot\" created.\n");

        let out = exec(&store, &["config", "use-context", "boot"]).unwrap();
        assert_eq!(out, "Switched to context \"boot\".\n");

        let out = exec(&store, &["config", "set-context", "--current", "--namespace", "infra"]).unwrap();
        assert_eq!(out, "Context \"boot\" modified.\n");

        let out = exec(&store, &["config", "get-context", "boot"]).unwrap();
        assert!(out.contains("lab_ephemeral"));
        assert!(out.contains("infra"));
    }

    #[test]
    fn unknown_context_is_missing_configuration() {
        let (store, _dir) = setup();
        let err = exec(&store, &["config", "use-context", "nope"]).unwrap_err();
        let err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(err.is_missing_configuration());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn credentials_are_redacted() {
        let (store, _dir) = setup();
        let out = exec(&store, &["config", "set-credentials", "ops", "--token", "s3cret"]).unwrap();
        assert_eq!(out, "User information \"ops\" created.\n");

        let out = exec(&store, &["config", "get-credentials", "ops"]).unwrap();
        assert!(out.contains("User: ops"));
        assert!(!out.contains("s3cret"));
    }

    #[test]
    fn view_as_json() {
        let (store, _dir) = setup();
        let out = exec(&store, &["config", "view", "-o", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value.get("clusters").is_some());
    }

    #[test]
    fn entrypoint_of_current_context() {
        let (store, _dir) = setup();
        exec(&store, &["config", "set-context", "default_target", "--manifest", "default"]).unwrap();
        exec(&store, &["config", "use-context", "default_target"]).unwrap();

        let out = exec(&store, &["cluster", "entrypoint"]).unwrap();
        assert_eq!(out, "/tmp/default/target/initinfra\n");

        let out = exec(
            &store,
            &["cluster", "entrypoint", "--cluster-type", "ephemeral", "--phase", "bootstrap"],
        )
        .unwrap();
        assert_eq!(out, "/tmp/default/ephemeral/bootstrap\n");
    }

    #[test]
    fn entrypoint_requires_current_context() {
        let (store, _dir) = setup();
        let err = exec(&store, &["cluster", "entrypoint"]).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>().unwrap().exit_code(), 3);
    }

    #[test]
    fn purge_removes_profile_only() {
        let (store, _dir) = setup();
        exec(&store, &["config", "set-cluster", "lab", "--cluster-type", "target"]).unwrap();
        assert!(store.profile_path().exists());

        exec(&store, &["config", "purge"]).unwrap();
        assert!(!store.profile_path().exists());
        assert!(store.kubeconfig_path().exists());

        assert!(exec(&store, &["config", "purge"]).is_err());
    }
}
