use crate::stage::Stage;
use crate::types::DomainSettings;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const LETSENCRYPT_PRODUCTION_DIRECTORY: &str =
    "https://acme-v02.api.letsencrypt.org/directory";
pub const LETSENCRYPT_STAGING_DIRECTORY: &str =
    "https://acme-staging-v02.api.letsencrypt.org/directory";

const CSR_FILE: &str = "domain.csr";
const SIGNED_CERT_FILE: &str = "signed.crt";
const CHAINED_CERT_FILE: &str = "chained.crt";
const ONGOING_CERT_FILE: &str = "signed.ongoing.crt";
const KEY_FILE: &str = "domain.key";
const HTACCESS_FILE: &str = "htaccess";
const WELCOME_PAGE_FILE: &str = "index.html";

/// Filesystem layout of one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainPaths {
    /// `<storage-root>/<name>/<stage>/`, the stage segment is empty when unresolved
    pub storage_dir: PathBuf,
    pub csr: PathBuf,
    pub signed_cert: PathBuf,
    /// Older layouts kept the full chain here
    pub chained_cert: PathBuf,
    /// Certificate being renewed, swapped in once complete
    pub ongoing_cert: PathBuf,
    pub key: PathBuf,
    pub htaccess: PathBuf,
    pub www_root: PathBuf,
    pub welcome_page: PathBuf,
}

impl DomainPaths {
    pub fn derive(settings: &DomainSettings, name: &str, stage: Option<Stage>) -> Self {
        let storage_dir = storage_dir(&settings.storage_root, name, stage);
        let www_root = settings.web_root_prefix.join(name);

        Self {
            csr: storage_dir.join(CSR_FILE),
            signed_cert: storage_dir.join(SIGNED_CERT_FILE),
            chained_cert: storage_dir.join(CHAINED_CERT_FILE),
            ongoing_cert: storage_dir.join(ONGOING_CERT_FILE),
            key: storage_dir.join(KEY_FILE),
            htaccess: storage_dir.join(HTACCESS_FILE),
            welcome_page: www_root.join(WELCOME_PAGE_FILE),
            storage_dir,
            www_root,
        }
    }
}

fn storage_dir(storage_root: &Path, name: &str, stage: Option<Stage>) -> PathBuf {
    let segment = stage.map(|s| s.as_str()).unwrap_or_default();
    storage_root.join(name).join(segment)
}
