//! End-to-end load, reconcile and persist cycles through real files.

use std::fs;

use rackctl_control::{ClusterOptions, ClusterType, Config, ConfigState, ContextOptions};
use rackctl_store::{FileStore, Kubeconfig, Profile, Store};
use tempfile::TempDir;

const UNSUFFIXED_KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
clusters:
- name: mycluster
  cluster:
    server: https://10.23.25.101:6443
contexts:
- name: ctx1
  context:
    cluster: mycluster
    user: admin
users:
- name: admin
  user:
    username: rackctl-admin
current-context: ctx1
";

const SSO_KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
preferences:
  colors: true
clusters:
- name: mycluster
  cluster:
    server: https://10.23.25.101:6443
    proxy-url: http://proxy:3128
contexts:
- name: sso
  context:
    cluster: mycluster
    user: oidc
users:
- name: oidc
  user:
    exec:
      apiVersion: client.authentication.k8s.io/v1beta1
      command: kubelogin
      args:
      - get-token
current-context: sso
";

fn setup(kubeconfig: &str) -> (TempDir, FileStore) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::in_dir(dir.path());
    fs::write(store.kubeconfig_path(), kubeconfig).unwrap();
    (dir, store)
}

#[test]
fn unsuffixed_cluster_is_renamed_everywhere() {
    let (_dir, store) = setup(UNSUFFIXED_KUBECONFIG);

    let config = Config::open(&store).unwrap();

    let report = config.last_report();
    assert!(report.is_mutated());
    assert_eq!(
        report.renames.get("mycluster").map(String::as_str),
        Some("mycluster_target")
    );
    assert_eq!(config.state(), ConfigState::Persisted);

    // Both files were rewritten
    let profile: Profile = serde_yaml::from_str(&fs::read_to_string(store.profile_path()).unwrap())
        .unwrap();
    let group = &profile.clusters["mycluster"];
    assert_eq!(
        group.types[&ClusterType::Target].name_in_kubeconf,
        "mycluster_target"
    );
    assert_eq!(profile.contexts["ctx1"].name_in_kubeconf, "mycluster_target");
    assert_eq!(profile.current_context, "ctx1");

    let kubeconfig = store.read_kubeconfig().unwrap().unwrap();
    assert!(kubeconfig.clusters.contains_key("mycluster_target"));
    assert!(!kubeconfig.clusters.contains_key("mycluster"));
    assert_eq!(kubeconfig.contexts["ctx1"].cluster, "mycluster_target");
    assert_eq!(
        kubeconfig.clusters["mycluster_target"].server.as_deref(),
        Some("https://10.23.25.101:6443")
    );
}

#[test]
fn rename_keeps_fields_rackctl_does_not_edit() {
    let (_dir, store) = setup(SSO_KUBECONFIG);

    let config = Config::open(&store).unwrap();
    assert_eq!(
        config.last_report().renames.get("mycluster").map(String::as_str),
        Some("mycluster_target")
    );

    let tree: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(store.kubeconfig_path()).unwrap()).unwrap();
    let cluster = &tree["clusters"][0];
    assert_eq!(cluster["name"].as_str(), Some("mycluster_target"));
    assert_eq!(cluster["cluster"]["proxy-url"].as_str(), Some("http://proxy:3128"));
    let user = &tree["users"][0];
    assert_eq!(user["name"].as_str(), Some("oidc"));
    assert_eq!(user["user"]["exec"]["command"].as_str(), Some("kubelogin"));
    assert_eq!(user["user"]["exec"]["args"][0].as_str(), Some("get-token"));
    assert_eq!(tree["preferences"]["colors"].as_bool(), Some(true));
    assert_eq!(tree["contexts"][0]["context"]["cluster"].as_str(), Some("mycluster_target"));

    // Reopening leaves the rewritten file alone
    let before = fs::read_to_string(store.kubeconfig_path()).unwrap();
    assert!(!Config::open(&store).unwrap().last_report().is_mutated());
    assert_eq!(fs::read_to_string(store.kubeconfig_path()).unwrap(), before);
}

#[test]
fn reopening_is_a_fixed_point() {
    let (_dir, store) = setup(UNSUFFIXED_KUBECONFIG);
    Config::open(&store).unwrap();
    let profile_before = fs::read_to_string(store.profile_path()).unwrap();
    let kubeconfig_before = fs::read_to_string(store.kubeconfig_path()).unwrap();

    let config = Config::open(&store).unwrap();

    assert!(!config.last_report().is_mutated());
    assert!(!config.is_dirty());
    assert_eq!(fs::read_to_string(store.profile_path()).unwrap(), profile_before);
    assert_eq!(
        fs::read_to_string(store.kubeconfig_path()).unwrap(),
        kubeconfig_before
    );
}

#[test]
fn consistent_files_are_not_written() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::in_dir(dir.path());

    let config = Config::open(&store).unwrap();

    assert!(!config.is_dirty());
    assert!(!store.profile_path().exists());
    assert!(!store.kubeconfig_path().exists());
}

#[test]
fn profile_selection_wins_over_kubeconfig() {
    let (_dir, store) = setup(UNSUFFIXED_KUBECONFIG);
    let mut config = Config::open(&store).unwrap();
    config
        .set_context(&ContextOptions {
            cluster: Some("mycluster".to_string()),
            auth_info: Some("admin".to_string()),
            ..ContextOptions::named("ctx2")
        })
        .unwrap();
    config.use_context("ctx2").unwrap();
    config.persist(&store).unwrap();

    // Point the kubeconfig back at ctx1 behind the engine's back
    let mut kubeconfig: Kubeconfig = store.read_kubeconfig().unwrap().unwrap();
    kubeconfig.current_context = "ctx1".to_string();
    store.write_kubeconfig(&kubeconfig).unwrap();

    let config = Config::open(&store).unwrap();
    assert!(config.last_report().current_repaired);
    assert_eq!(config.profile().current_context, "ctx2");
    assert_eq!(store.read_kubeconfig().unwrap().unwrap().current_context, "ctx2");
}

#[test]
fn insecure_then_ca_file_round_trips() {
    let (dir, store) = setup(UNSUFFIXED_KUBECONFIG);
    let ca = dir.path().join("ca.pem");
    fs::write(&ca, "PEM").unwrap();

    let mut config = Config::open(&store).unwrap();
    config
        .modify_cluster(&ClusterOptions {
            insecure_skip_tls_verify: true,
            ..ClusterOptions::new("mycluster", ClusterType::Target)
        })
        .unwrap();
    config
        .modify_cluster(&ClusterOptions {
            certificate_authority: Some(ca.clone()),
            ..ClusterOptions::new("mycluster", ClusterType::Target)
        })
        .unwrap();
    assert!(config.persist_if_dirty(&store).unwrap());

    let cluster = &store.read_kubeconfig().unwrap().unwrap().clusters["mycluster_target"];
    assert!(!cluster.insecure_skip_tls_verify.unwrap_or(false));
    assert_eq!(
        cluster.certificate_authority.as_deref(),
        Some(ca.display().to_string().as_str())
    );
}

#[test]
fn purge_keeps_kubeconfig() {
    let (_dir, store) = setup(UNSUFFIXED_KUBECONFIG);
    let config = Config::open(&store).unwrap();

    config.purge(&store).unwrap();

    assert!(!store.profile_path().exists());
    assert!(store.kubeconfig_path().exists());
    assert!(config.purge(&store).is_err());
}
