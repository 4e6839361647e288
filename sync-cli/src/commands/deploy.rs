//! Deploy the site.

use anyhow::{anyhow, bail, Context, Result};
use neosync_client::{
    fetch_remote_inventory, scan, MockApi, NeocitiesApi, RemoteApi, ScanOptions, TransferExecutor,
};
use neosync_core::{plan, PlanOptions, SyncOptions, SyncSummary};
use neosync_types::{Inventory, SyncPlan};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{info, warn};

use super::{api_key, format_bytes, is_ci, scope_prefix};
use crate::config::{SiteConfig, SITENAME_VAR};
use crate::manifest;
use crate::DeployArgs;

/// Run the deploy command.
pub async fn run(config: &SiteConfig, args: &DeployArgs, use_mock: bool, verbose: bool) -> Result<()> {
    let options = sync_options(config, args)?;
    let ci = is_ci();

    let summary = if use_mock {
        run_with(MockApi::new(), config, args, options, ci, verbose).await?
    } else {
        let key = api_key()?;
        if let Ok(site) = std::env::var(SITENAME_VAR) {
            info!(site = %site, "deploying");
        }
        let api = NeocitiesApi::with_base_url(key, &config.api_url);
        run_with(api, config, args, options, ci, verbose).await?
    };

    ensure_success(&summary)
}

/// Turn any failed unit into an error, so the process exits non-zero.
fn ensure_success(summary: &SyncSummary) -> Result<()> {
    if !summary.is_success() {
        bail!(
            "{} path(s) failed: {}",
            summary.failed(),
            summary.failed_paths().join(", ")
        );
    }
    Ok(())
}

/// Config values with command-line overrides applied.
fn sync_options(config: &SiteConfig, args: &DeployArgs) -> Result<SyncOptions> {
    let mut options = config.sync_options();
    options.dry_run = args.dry_run;
    if let Some(secs) = args.rate_limit {
        options.rate_limit = Duration::try_from_secs_f64(secs)
            .map_err(|_| anyhow!("Invalid --rate-limit {}", secs))?;
    }
    if let Some(retries) = args.max_retries {
        options.max_retries = retries;
    }
    if let Some(size) = args.batch_size {
        options.batch_size = size;
    }
    options.validate().context("Invalid sync options")?;
    Ok(options)
}

/// Scan, fetch, plan, confirm and execute against any API.
async fn run_with<A: RemoteApi>(
    api: A,
    config: &SiteConfig,
    args: &DeployArgs,
    options: SyncOptions,
    ci: bool,
    verbose: bool,
) -> Result<SyncSummary> {
    let scope = scope_prefix(args.scope.as_deref())?;
    let plan_options = PlanOptions::default()
        .with_full_refresh(args.full_refresh)
        .with_force(args.force)
        .with_protected(options.protection_rules().context("Invalid protect pattern")?)
        .with_excluded(config.excluded_rules(&args.include)?);

    let scan_options = ScanOptions {
        scope: scope.clone(),
        skip_hidden: config.sync.skip_hidden,
    };
    // Hashing reads every file; keep it off the runtime threads
    let source = config.source.clone();
    let local = tokio::task::spawn_blocking(move || scan(&source, &scan_options))
        .await
        .context("Scan task failed")?
        .with_context(|| format!("Failed to scan {}", config.source.display()))?;
    info!(
        files = local.len(),
        bytes = local.total_bytes(),
        "scanned local inventory"
    );

    if !args.skip_manifest_check {
        verify_manifest(config, &local, scope.as_deref())?;
    }

    let executor = TransferExecutor::new(api, options).context("Invalid sync options")?;
    let remote = fetch_remote_inventory(executor.api(), scope.as_deref())
        .await
        .context("Failed to fetch remote inventory")?;

    let mut plan = plan(&local, &remote, &plan_options);
    print_plan(&plan, verbose);

    if plan.is_empty() {
        println!("Nothing to deploy.");
        let summary = SyncSummary::new(plan.skipped().len());
        print_summary(&summary);
        return Ok(summary);
    }

    if !args.dry_run && !plan.to_delete().is_empty() {
        let stdin = io::stdin();
        let proceed = confirm_deletes(plan.to_delete().len(), args.yes, ci, || {
            let mut answer = String::new();
            stdin.lock().read_line(&mut answer)?;
            Ok(answer)
        })?;
        if !proceed {
            plan = plan.without_deletes();
        }
    }

    let summary = executor.execute(&plan, &config.source).await;
    for outcome in summary.outcomes() {
        for line in outcome.status_lines() {
            println!("{}", line);
        }
    }
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &SyncSummary) {
    println!();
    println!("Summary: {}", summary);
}

fn verify_manifest(config: &SiteConfig, local: &Inventory, scope: Option<&str>) -> Result<()> {
    let path = match &config.manifest {
        Some(path) => path,
        None => return Ok(()),
    };
    if !path.exists() {
        warn!(path = %path.display(), "release manifest not found, skipping check");
        return Ok(());
    }

    let report = manifest::check_file(path, local, scope)?;
    info!(releases = report.releases, "release manifest checked");
    for orphan in &report.orphans {
        warn!(path = %orphan, "local file not referenced by any release");
    }
    if !report.is_complete() {
        bail!(
            "{} file(s) referenced in {} are missing locally: {}",
            report.missing.len(),
            path.display(),
            report.missing.join(", ")
        );
    }
    Ok(())
}

fn print_plan(plan: &SyncPlan, verbose: bool) {
    println!(
        "Plan: {} upload(s) ({}), {} delete(s), {} skipped",
        plan.to_upload().len(),
        format_bytes(plan.upload_bytes()),
        plan.to_delete().len(),
        plan.skipped().len()
    );
    if verbose {
        for entry in plan.skipped() {
            println!("  [skip] {} ({})", entry.path, entry.reason);
        }
    }
    if !plan.to_delete().is_empty() {
        println!("Remote files not present locally:");
        for path in plan.to_delete() {
            println!("  - {}", path);
        }
    }
}

/// Decide whether the delete set goes ahead.
///
/// `--yes` always proceeds. In CI there is nobody to ask, so deletes are
/// skipped. Otherwise the answer must be `y` or `yes`.
fn confirm_deletes<F>(count: usize, yes: bool, ci: bool, read_answer: F) -> Result<bool>
where
    F: FnOnce() -> io::Result<String>,
{
    if yes {
        return Ok(true);
    }
    if ci {
        warn!(
            count,
            "non-interactive environment, skipping remote deletes (pass --yes to delete)"
        );
        return Ok(false);
    }

    print!("Delete {} remote file(s)? (y/N): ", count);
    io::stdout().flush().context("Failed to write prompt")?;
    let answer = read_answer().context("Failed to read answer")?;
    let proceed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    if !proceed {
        println!("Keeping remote files.");
    }
    Ok(proceed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn site(files: &[(&str, &[u8])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        dir
    }

    fn config_for(root: &Path) -> SiteConfig {
        SiteConfig {
            source: root.to_path_buf(),
            ..SiteConfig::default()
        }
    }

    // ===========================================
    // Option Override Tests
    // ===========================================

    #[test]
    fn flags_override_config() {
        let args = DeployArgs {
            dry_run: true,
            rate_limit: Some(0.25),
            max_retries: Some(7),
            batch_size: Some(5),
            ..DeployArgs::default()
        };
        let options = sync_options(&SiteConfig::default(), &args).unwrap();

        assert!(options.dry_run);
        assert_eq!(options.rate_limit, Duration::from_millis(250));
        assert_eq!(options.max_retries, 7);
        assert_eq!(options.batch_size, 5);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let negative = DeployArgs {
            rate_limit: Some(-1.0),
            ..DeployArgs::default()
        };
        assert!(sync_options(&SiteConfig::default(), &negative).is_err());

        let zero_batch = DeployArgs {
            batch_size: Some(0),
            ..DeployArgs::default()
        };
        assert!(sync_options(&SiteConfig::default(), &zero_batch).is_err());
    }

    // ===========================================
    // Confirmation Tests
    // ===========================================

    #[test]
    fn yes_flag_skips_prompt() {
        let proceed = confirm_deletes(3, true, true, || panic!("should not ask")).unwrap();
        assert!(proceed);
    }

    #[test]
    fn ci_skips_deletes_without_asking() {
        let proceed = confirm_deletes(3, false, true, || panic!("should not ask")).unwrap();
        assert!(!proceed);
    }

    #[test]
    fn interactive_answer_decides() {
        assert!(confirm_deletes(1, false, false, || Ok("y\n".into())).unwrap());
        assert!(confirm_deletes(1, false, false, || Ok("YES\n".into())).unwrap());
        assert!(!confirm_deletes(1, false, false, || Ok("\n".into())).unwrap());
        assert!(!confirm_deletes(1, false, false, || Ok("nope\n".into())).unwrap());
    }

    // ===========================================
    // End-to-end Tests (mock API)
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn uploads_only_changed_files() {
        let dir = site(&[("index.html", b"<h1>new</h1>"), ("about.html", b"same")]);
        let mock = MockApi::new()
            .with_file("index.html", b"<h1>old</h1>")
            .with_file("about.html", b"same");
        let config = config_for(dir.path());
        let args = DeployArgs::default();
        let options = sync_options(&config, &args).unwrap();

        let summary = run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();

        assert_eq!(mock.upload_log(), vec!["index.html"]);
        assert_eq!(summary.uploaded(), 1);
        assert_eq!(summary.skipped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn full_refresh_with_yes_deletes_stale_files() {
        let dir = site(&[("index.html", b"home")]);
        let mock = MockApi::new()
            .with_file("index.html", b"home")
            .with_file("old.html", b"stale")
            .with_file("not_found.html", b"404");
        let mut config = config_for(dir.path());
        config.sync.protect = vec!["not_found.html".into()];
        let args = DeployArgs {
            full_refresh: true,
            yes: true,
            ..DeployArgs::default()
        };
        let options = sync_options(&config, &args).unwrap();

        let summary = run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();

        assert_eq!(summary.deleted(), 1);
        assert_eq!(mock.remote_paths(), vec!["index.html", "not_found.html"]);
    }

    #[tokio::test(start_paused = true)]
    async fn ci_without_yes_keeps_remote_files() {
        let dir = site(&[("index.html", b"home"), ("new.html", b"new")]);
        let mock = MockApi::new()
            .with_file("index.html", b"home")
            .with_file("old.html", b"stale");
        let config = config_for(dir.path());
        let args = DeployArgs {
            full_refresh: true,
            ..DeployArgs::default()
        };
        let options = sync_options(&config, &args).unwrap();

        let summary = run_with(mock.clone(), &config, &args, options, true, false)
            .await
            .unwrap();

        assert_eq!(summary.uploaded(), 1);
        assert_eq!(summary.deleted(), 0);
        assert!(mock.delete_batches().is_empty());
        assert!(mock.remote_paths().contains(&"old.html".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn excluded_category_is_neither_uploaded_nor_deleted() {
        let dir = site(&[("index.html", b"home"), ("music/new.mp3", b"new")]);
        let mock = MockApi::new().with_file("music/old.mp3", b"old");
        let mut config = SiteConfig::parse("[categories.music]\npatterns = [\"*.mp3\"]").unwrap();
        config.source = dir.path().to_path_buf();
        let args = DeployArgs {
            full_refresh: true,
            yes: true,
            ..DeployArgs::default()
        };
        let options = sync_options(&config, &args).unwrap();

        run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();

        assert_eq!(mock.upload_log(), vec!["index.html"]);
        assert!(mock.delete_batches().is_empty());

        // Opting in uploads the new file and deletes the stale one
        let args = DeployArgs {
            include: vec!["music".into()],
            ..args
        };
        let options = sync_options(&config, &args).unwrap();
        run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();
        assert_eq!(mock.upload_attempts("music/new.mp3"), 1);
        assert!(!mock.remote_paths().contains(&"music/old.mp3".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_manifest_audio_stops_before_network() {
        let dir = site(&[
            ("index.html", b"home"),
            (
                "config/releases.json",
                br#"{"releases":[{"audio":"/music/gone.mp3"}]}"#,
            ),
        ]);
        let mock = MockApi::new();
        let mut config = config_for(dir.path());
        config.manifest = Some(dir.path().join("config/releases.json"));
        let args = DeployArgs::default();
        let options = sync_options(&config, &args).unwrap();

        let err = run_with(mock.clone(), &config, &args, options.clone(), false, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("music/gone.mp3"), "got: {}", err);
        assert_eq!(mock.list_calls(), 0);

        let args = DeployArgs {
            skip_manifest_check: true,
            ..DeployArgs::default()
        };
        assert!(run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_upload_is_reported_in_summary() {
        let dir = site(&[("bad.exe", b"nope")]);
        let mock = MockApi::new();
        mock.always_fail_upload("bad.exe", "invalid_file_type");
        let config = config_for(dir.path());
        let args = DeployArgs::default();
        let options = sync_options(&config, &args).unwrap();

        let summary = run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failed_paths(), vec!["bad.exe"]);

        let err = ensure_success(&summary).unwrap_err();
        assert_eq!(err.to_string(), "1 path(s) failed: bad.exe");
    }

    #[test]
    fn clean_summary_is_success() {
        assert!(ensure_success(&SyncSummary::new(3)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_scope_directory_stops_before_network() {
        let dir = site(&[("index.html", b"home")]);
        let mock = MockApi::new()
            .with_file("music/a.mp3", b"a")
            .with_file("music/b.mp3", b"b");
        let config = config_for(dir.path());
        let args = DeployArgs {
            full_refresh: true,
            yes: true,
            scope: Some("music".into()),
            ..DeployArgs::default()
        };
        let options = sync_options(&config, &args).unwrap();

        let err = run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap_err();

        let msg = format!("{:#}", err);
        assert!(msg.contains("scope directory not found"), "got: {}", msg);
        assert_eq!(mock.list_calls(), 0);
        assert!(mock.delete_batches().is_empty());
        assert_eq!(mock.remote_paths(), vec!["music/a.mp3", "music/b.mp3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_site_reports_skipped_files() {
        let dir = site(&[("index.html", b"home")]);
        let mock = MockApi::new().with_file("index.html", b"home");
        let config = config_for(dir.path());
        let args = DeployArgs::default();
        let options = sync_options(&config, &args).unwrap();

        let summary = run_with(mock.clone(), &config, &args, options, false, false)
            .await
            .unwrap();

        assert_eq!(summary.skipped(), 1);
        assert_eq!(
            summary.to_string(),
            "uploaded: 0, failed: 0, deleted: 0, skipped: 1"
        );
        assert!(mock.upload_log().is_empty());
    }
}
