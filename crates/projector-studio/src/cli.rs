use std::path::PathBuf;

use clap::Parser;
use projector_engine::orchestrator::StageConfig;

use crate::app::StudioOptions;

#[derive(Parser, Debug)]
#[command(
    name = "projector-studio",
    version,
    about = "Projects a slide onto drifting planes and composites it full screen"
)]
pub struct Cli {
    /// Slide image projected onto the scene (PNG or JPEG).
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Seed for element placement; omitted draws from entropy.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Number of animated elements.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// Append the film grain effect to the post chain.
    #[arg(long)]
    pub film: bool,

    /// Initial panel value, e.g. `repeat=12`. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, f32)>,
}

impl Cli {
    pub fn into_options(self) -> StudioOptions {
        let mut stage = StageConfig::default();
        if let Some(image) = self.image {
            stage.texture_path = image;
        }
        if let Some(count) = self.count {
            stage.element_count = count;
        }
        stage.seed = self.seed;

        StudioOptions {
            stage,
            film: self.film,
            params: self.params,
        }
    }
}

pub fn parse_param(value: &str) -> Result<(String, f32), String> {
    let Some((name, raw)) = value.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got '{value}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{value}'"));
    }
    let parsed: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid value '{raw}' for parameter '{name}'"))?;
    Ok((name.to_string(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_argument_is_the_slide() {
        let cli = Cli::try_parse_from(["projector-studio", "slide.png", "--seed", "9", "--film"]).unwrap();
        let options = cli.into_options();
        assert_eq!(options.stage.texture_path, PathBuf::from("slide.png"));
        assert_eq!(options.stage.seed, Some(9));
        assert!(options.film);
    }

    #[test]
    fn omitted_arguments_keep_stage_defaults() {
        let options = Cli::try_parse_from(["projector-studio"]).unwrap().into_options();
        let defaults = StageConfig::default();
        assert_eq!(options.stage.texture_path, defaults.texture_path);
        assert_eq!(options.stage.element_count, defaults.element_count);
        assert_eq!(options.stage.seed, None);
        assert!(!options.film);
    }

    #[test]
    fn set_pairs_are_collected_in_order() {
        let cli = Cli::try_parse_from([
            "projector-studio",
            "--set",
            "repeat=12",
            "--set",
            "rotation=0.5",
            "--count",
            "10",
        ])
        .unwrap();
        assert_eq!(
            cli.params,
            vec![("repeat".to_string(), 12.0), ("rotation".to_string(), 0.5)]
        );
        assert_eq!(cli.into_options().stage.element_count, 10);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["projector-studio", "--set", "repeat"]).is_err());
        assert!(Cli::try_parse_from(["projector-studio", "--set", "=3"]).is_err());
        assert!(Cli::try_parse_from(["projector-studio", "--seed"]).is_err());
        assert!(Cli::try_parse_from(["projector-studio", "--count", "many"]).is_err());
        assert!(Cli::try_parse_from(["projector-studio", "--bogus"]).is_err());
    }
}
