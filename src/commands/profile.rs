//! Profile command - show or save the agreed sampling settings.

use anyhow::{Context, Result};
use clap::Args;

use tokenhide::SamplingConfig;

use super::{CommandExecutor, SamplingArgs};

/// Show the resolved sampling settings, or save them as a profile.
///
/// Share the profile with the other party so both sides decode with the
/// same values.
#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Save the resolved settings to --profile (or the default profile path)
    #[arg(long)]
    pub save: bool,
}

impl CommandExecutor for ProfileCommand {
    fn execute(&self) -> Result<()> {
        let config = self.sampling.resolve_with(self.save)?;

        if self.save {
            let path = match &self.sampling.profile {
                Some(path) => path.clone(),
                None => SamplingConfig::profile_path()?,
            };
            config
                .save(&path)
                .with_context(|| format!("Failed to save profile to {}", path.display()))?;
            eprintln!("Profile saved to {}", path.display());
        }

        print!("{}", config.to_toml()?);
        Ok(())
    }
}
