use anyhow::Context;
use portal_common::{DomainManifest, EnvConfig};
use portal_domain::{
    DomainSettings, WelcomeOutcome, WelcomePageProvisioner, load_domains, split_descriptors,
};
use tracing::{debug, error, info, warn};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,portal=debug")),
        )
        .init();

    info!("Portal starting...");

    let env = EnvConfig::load(None);
    env.validate()?;
    info!(
        default_stage = %env.default_stage,
        storage_root = %env.storage_root.display(),
        web_root_prefix = %env.web_root_prefix.display(),
        "Configuration loaded"
    );

    let mut descriptors = split_descriptors(&env.domains);
    if let Some(path) = &env.domains_file {
        let manifest = DomainManifest::load_from_file(path)
            .with_context(|| format!("Failed to load domains file {}", path.display()))?;
        descriptors.extend(manifest.domains);
    }

    if descriptors.is_empty() {
        warn!("No domains configured, set DOMAINS or DOMAINS_FILE");
        return Ok(());
    }

    let report = load_domains(&descriptors, &DomainSettings::from(&env));
    let provisioner = WelcomePageProvisioner::new(&env.welcome_template_path);

    let mut created = 0;
    for domain in &report.domains {
        if let Ok(summary) = serde_json::to_string(domain) {
            debug!(domain = %domain.name(), %summary, "Domain summary");
        }

        if let Err(e) = domain.require_stage() {
            warn!(domain = %domain.name(), error = %e, "Skipping welcome page");
            continue;
        }

        match provisioner.ensure(domain, &env) {
            Ok(WelcomeOutcome::Created(_)) => created += 1,
            Ok(_) => {}
            Err(e) => error!(domain = %domain.name(), error = %e, "Failed to provision welcome page"),
        }
    }

    info!(
        domains = report.domains.len(),
        failures = report.failures.len(),
        welcome_pages_created = created,
        "Domains processed"
    );

    if !report.failures.is_empty() {
        anyhow::bail!(
            "{} of {} domain descriptors are invalid",
            report.failures.len(),
            descriptors.len()
        );
    }

    Ok(())
}
