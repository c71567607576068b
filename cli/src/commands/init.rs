use std::path::Path;

use crate::app_config::AppConfig;

/// Writes the resolved configuration as the profile file
pub fn init_cmd(config: &AppConfig, force: bool) -> Result<(), anyhow::Error> {
    let profile_path = Path::new(&config.profile_path);

    if profile_path.exists() && !force {
        anyhow::bail!(
            "Profile '{}' already exists at {:?}, use --force to overwrite it",
            config.profile_name,
            profile_path
        );
    }

    config.to_profile().save(profile_path)?;
    println!(
        "Profile '{}' written to {}",
        config.profile_name,
        profile_path.display()
    );

    Ok(())
}
