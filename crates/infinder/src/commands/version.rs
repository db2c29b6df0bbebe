//! Version command

use crate::cli::VersionArgs;
use crate::output;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.display());

        if let Some(commit) = &info.commit {
            output::kv("Commit", commit);
        }
        if let Some(target) = &info.target {
            output::kv("Target", target);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_display_contains_version() {
        let info = VersionInfo::current();
        let display = info.display();
        assert!(display.starts_with("infinder "));
        assert!(display.contains(&info.version));
    }

    #[test]
    fn test_version_info_json_serialization() {
        let info = VersionInfo::current();
        let json = serde_json::to_string(&info).expect("should serialize to JSON");
        assert!(json.contains(&info.version));
    }
}
