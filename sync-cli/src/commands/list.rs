//! List the files on the remote site.

use anyhow::{Context, Result};
use neosync_client::{fetch_remote_inventory, MockApi, NeocitiesApi, RemoteApi};
use neosync_types::Inventory;

use super::{api_key, format_bytes, scope_prefix};
use crate::config::SiteConfig;

/// Run the list command.
pub async fn run(config: &SiteConfig, scope: Option<&str>, use_mock: bool) -> Result<()> {
    let scope = scope_prefix(scope)?;
    let remote = if use_mock {
        fetch(&MockApi::new(), scope.as_deref()).await?
    } else {
        let api = NeocitiesApi::with_base_url(api_key()?, &config.api_url);
        fetch(&api, scope.as_deref()).await?
    };
    print!("{}", render(&remote));
    Ok(())
}

async fn fetch<A: RemoteApi>(api: &A, scope: Option<&str>) -> Result<Inventory> {
    fetch_remote_inventory(api, scope)
        .await
        .context("Failed to fetch remote inventory")
}

fn render(remote: &Inventory) -> String {
    if remote.is_empty() {
        return "No remote files.\n".to_string();
    }
    let mut out = String::new();
    for record in remote.records() {
        out.push_str(&format!(
            "{}  {:>10}  {}\n",
            record.content_hash.short(),
            format_bytes(record.size_bytes),
            record.relative_path
        ));
    }
    out.push_str(&format!(
        "{} file(s), {}\n",
        remote.len(),
        format_bytes(remote.total_bytes())
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_remote_listing() {
        let mock = MockApi::new()
            .with_directory("music")
            .with_file("music/a.mp3", &[0u8; 2048])
            .with_file("index.html", b"home");

        let remote = fetch(&mock, None).await.unwrap();
        let out = render(&remote);

        assert!(out.contains("index.html"));
        assert!(out.contains("2.0 KiB"));
        assert!(out.ends_with("2 file(s), 2.0 KiB\n"));
    }

    #[tokio::test]
    async fn empty_site() {
        let remote = fetch(&MockApi::new(), None).await.unwrap();
        assert_eq!(render(&remote), "No remote files.\n");
    }
}
