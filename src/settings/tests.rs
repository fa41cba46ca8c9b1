use crate::settings::{CliArgs, Command};
use clap::Parser;

#[test]
fn cli_settings_map_onto_extractor_and_loader_settings() -> Result<(), anyhow::Error> {
    let args = CliArgs::try_parse_from([
        "scenepack",
        "--max-archive-size",
        "1024",
        "--offline",
        "resolve",
        "duck.zip",
        "Duck0.bin",
        "--base-dir",
        "Duck/glTF/",
    ])?;

    assert_eq!(args.archive().to_str(), Some("duck.zip"));
    assert_eq!(args.extractor_settings().max_archive_size, 1024);
    assert_eq!(args.extractor_settings().max_member_size, None);
    assert!(!args.loader_settings().allow_network);
    assert!(matches!(
        args.command,
        Command::Resolve { ref reference, ref base_dir, .. }
            if reference == "Duck0.bin" && base_dir.as_deref() == Some("Duck/glTF/")
    ));
    Ok(())
}
