//! Critical CSS via the `critical` CLI.

use super::{CriticalCss, CriticalRequest, NPX};
use crate::utils::exec::{Cmd, FilterRule};
use anyhow::Result;
use std::ffi::OsString;

static CRITICAL_FILTER: FilterRule = FilterRule::new(&["npm WARN", "npm notice"]);

#[derive(Debug, Default, Clone, Copy)]
pub struct CriticalCli;

impl CriticalCss for CriticalCli {
    fn generate(&self, request: &CriticalRequest) -> Result<()> {
        Cmd::from_slice(&[NPX, "critical"])
            .args(cli_args(request))
            .cwd(&request.base_dir)
            .filter(&CRITICAL_FILTER)
            .run()?;
        Ok(())
    }
}

/// Command line flags for a request (after `npx critical`).
fn cli_args(request: &CriticalRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        request.source.clone().into(),
        "--base".into(),
        request.base_dir.clone().into(),
        "--target".into(),
        request.target.clone().into(),
        "--width".into(),
        request.width.to_string().into(),
        "--height".into(),
        request.height.to_string().into(),
    ];
    if request.inline {
        args.push("--inline".into());
    }
    if request.extract {
        args.push("--extract".into());
    }
    for path in &request.asset_paths {
        args.push("--assetPaths".into());
        args.push(path.clone().into());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request() -> CriticalRequest {
        CriticalRequest {
            base_dir: PathBuf::from("/site/dist"),
            source: "index.html".into(),
            target: "index.html".into(),
            inline: true,
            extract: false,
            width: 1300,
            height: 900,
            asset_paths: vec![PathBuf::from("/site"), PathBuf::from("/site/dist")],
        }
    }

    #[test]
    fn test_cli_args() {
        let args: Vec<String> = cli_args(&request())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "index.html");
        assert!(args.windows(2).any(|w| w == ["--width", "1300"]));
        assert!(args.windows(2).any(|w| w == ["--height", "900"]));
        assert!(args.windows(2).any(|w| w == ["--target", "index.html"]));
        assert!(args.contains(&"--inline".to_string()));
        assert!(!args.contains(&"--extract".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "--assetPaths").count(), 2);
    }

    #[test]
    fn test_extract_flag() {
        let mut request = request();
        request.extract = true;
        assert!(cli_args(&request).contains(&OsString::from("--extract")));
    }
}
