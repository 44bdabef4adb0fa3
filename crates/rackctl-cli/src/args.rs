//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rackctl_control::ClusterType;
use rackctl_store::schema::{files, phases};
use rackctl_store::FileStore;

/// rackctl - manage bare metal Kubernetes site configuration.
#[derive(Parser, Debug)]
#[command(name = "rackctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the profile file.
    #[arg(long, global = true, env = "RACKCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the kubeconfig file.
    #[arg(long, global = true, env = "RACKCTL_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The store over the selected files, defaulting to `$HOME/.rackctl`.
    pub fn store(&self) -> FileStore {
        let dir = FileStore::default_dir().unwrap_or_else(|| PathBuf::from(files::CONFIG_DIR));
        FileStore::new(
            self.config
                .clone()
                .unwrap_or_else(|| dir.join(files::PROFILE_FILE)),
            self.kubeconfig
                .clone()
                .unwrap_or_else(|| dir.join(files::KUBECONFIG_FILE)),
        )
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the profile and kubeconfig.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Query cluster deployment settings.
    #[command(subcommand)]
    Cluster(ClusterCommand),
}

/// `rackctl config ...`
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display one cluster, or every cluster.
    GetCluster {
        /// Cluster name.
        name: Option<String>,
        /// Cluster type.
        #[arg(long)]
        cluster_type: Option<ClusterType>,
    },

    /// Create or modify a cluster.
    SetCluster(SetClusterArgs),

    /// Display one context, or every context.
    GetContext {
        /// Context name.
        #[arg(conflicts_with = "current")]
        name: Option<String>,
        /// Display the current context.
        #[arg(long)]
        current: bool,
    },

    /// Create or modify a context.
    SetContext(SetContextArgs),

    /// Switch the current context.
    UseContext {
        /// Context name.
        name: String,
    },

    /// Display one credential, or every credential.
    GetCredentials {
        /// Credential name.
        name: Option<String>,
    },

    /// Create or modify a credential.
    SetCredentials(SetCredentialsArgs),

    /// Display the profile.
    View {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Delete the profile file. The kubeconfig is kept.
    Purge,
}

/// Arguments of `config set-cluster`.
#[derive(Args, Debug)]
pub struct SetClusterArgs {
    /// Cluster name, without type suffix.
    pub name: String,

    /// Cluster type.
    #[arg(long)]
    pub cluster_type: ClusterType,

    /// API server URL.
    #[arg(long)]
    pub server: Option<String>,

    /// Skip server certificate verification.
    #[arg(long, conflicts_with = "certificate_authority")]
    pub insecure_skip_tls_verify: bool,

    /// Path to a CA bundle.
    #[arg(long)]
    pub certificate_authority: Option<PathBuf>,

    /// Store the CA bundle contents instead of its path.
    #[arg(long, requires = "certificate_authority")]
    pub embed_certs: bool,

    /// Bootstrap-info record used by the cluster.
    #[arg(long)]
    pub bootstrap_info: Option<String>,

    /// Management configuration used by the cluster.
    #[arg(long)]
    pub management_config: Option<String>,
}

/// Arguments of `config set-context`.
#[derive(Args, Debug)]
pub struct SetContextArgs {
    /// Context name.
    #[arg(required_unless_present = "current", conflicts_with = "current")]
    pub name: Option<String>,

    /// Modify the current context.
    #[arg(long)]
    pub current: bool,

    /// Cluster the context points at.
    #[arg(long)]
    pub cluster: Option<String>,

    /// Type of that cluster.
    #[arg(long)]
    pub cluster_type: Option<ClusterType>,

    /// Credential used by the context.
    #[arg(long)]
    pub user: Option<String>,

    /// Manifest deployed through the context.
    #[arg(long)]
    pub manifest: Option<String>,

    /// Default namespace.
    #[arg(long)]
    pub namespace: Option<String>,
}

/// Arguments of `config set-credentials`.
#[derive(Args, Debug)]
pub struct SetCredentialsArgs {
    /// Credential name.
    pub name: String,

    /// Path to a client certificate.
    #[arg(long)]
    pub client_certificate: Option<PathBuf>,

    /// Path to a client key.
    #[arg(long)]
    pub client_key: Option<PathBuf>,

    /// Store the certificate and key contents instead of their paths.
    #[arg(long, requires = "client_certificate")]
    pub embed_certs: bool,

    /// Bearer token.
    #[arg(long, conflicts_with_all = ["username", "password"])]
    pub token: Option<String>,

    /// Basic auth username.
    #[arg(long)]
    pub username: Option<String>,

    /// Basic auth password.
    #[arg(long)]
    pub password: Option<String>,
}

/// `rackctl cluster ...`
#[derive(Subcommand, Debug)]
pub enum ClusterCommand {
    /// Print the document bundle path of a phase for the current context.
    Entrypoint {
        /// Cluster type.
        #[arg(long, default_value_t = ClusterType::Target)]
        cluster_type: ClusterType,
        /// Deployment phase.
        #[arg(long, default_value = phases::INITINFRA)]
        phase: String,
    },
}

/// Rendering of `config view`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML, the on-disk format.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}
