//! Headless segannot entry point.
//!
//! Loads an image, extracts regions, annotates the region under each
//! `label@x,y` point and writes the COCO document.

use std::path::PathBuf;
use std::process::ExitCode;

use segannot::config::AnnotatorConfig;
use segannot::session::{ClickOutcome, Session};
use segannot::{EdgeParams, ExtractionParams, SuperpixelParams};

const USAGE: &str = "usage: segannot <image> <output.json> \
[--superpixels N | --edges SIGMA LOW HIGH] [--overlay out.png] [label@x,y ...]\n       \
segannot --save-config";

/// Parsed command line.
#[derive(Debug)]
struct Args {
    image: PathBuf,
    output: PathBuf,
    params: Option<ExtractionParams>,
    overlay: Option<PathBuf>,
    points: Vec<(String, i64, i64)>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let image = args.next().ok_or("missing image path")?;
    let output = args.next().ok_or("missing output path")?;
    let mut parsed = Args {
        image: PathBuf::from(image),
        output: PathBuf::from(output),
        params: None,
        overlay: None,
        points: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--superpixels" => {
                let count = next_number::<u32>(&mut args, "--superpixels")?;
                parsed.params = Some(ExtractionParams::Superpixel(SuperpixelParams {
                    target_region_count: count,
                    ..SuperpixelParams::default()
                }));
            }
            "--edges" => {
                let sigma = next_number::<f32>(&mut args, "--edges SIGMA")?;
                let low = next_number::<f32>(&mut args, "--edges LOW")?;
                let high = next_number::<f32>(&mut args, "--edges HIGH")?;
                parsed.params = Some(ExtractionParams::Edge(EdgeParams {
                    sigma,
                    low_threshold: low,
                    high_threshold: high,
                    ..EdgeParams::default()
                }));
            }
            "--overlay" => {
                let path = args.next().ok_or("--overlay needs a path")?;
                parsed.overlay = Some(PathBuf::from(path));
            }
            point => parsed.points.push(parse_point(point)?),
        }
    }
    Ok(parsed)
}

fn next_number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    what: &str,
) -> Result<T, String> {
    let raw = args.next().ok_or_else(|| format!("{} needs a value", what))?;
    raw.parse()
        .map_err(|_| format!("{}: '{}' is not a valid number", what, raw))
}

/// `label@x,y`
fn parse_point(arg: &str) -> Result<(String, i64, i64), String> {
    let invalid = || format!("expected label@x,y, got '{}'", arg);
    let (label, coords) = arg.rsplit_once('@').ok_or_else(invalid)?;
    let (x, y) = coords.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((label.to_string(), x, y))
}

fn run(args: Args, config: AnnotatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config);
    if let Some(params) = args.params {
        session.set_params(params)?;
    }
    session.load_image(&args.image)?;

    for (label, x, y) in &args.points {
        match session.click(*x, *y) {
            ClickOutcome::Selected(region) => {
                let id = session.add_annotation(label)?;
                log::info!("Annotation {} '{}' from region {}", id, label, region);
            }
            ClickOutcome::Deselected(_) | ClickOutcome::Ignored => {
                session.clear_selection();
                log::warn!("No region at ({}, {}), skipping '{}'", x, y, label);
            }
        }
    }

    session.save_json(&args.output)?;
    if let Some(path) = &args.overlay {
        let overlay = session.overlay().ok_or("no image loaded")?;
        overlay.save(path)?;
        log::info!("Wrote overlay to {:?}", path);
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = AnnotatorConfig::load_from_default_path().unwrap_or_default();
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv == ["--save-config"] {
        return match config.save_to_default_path() {
            Ok(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let args = match parse_args(argv.into_iter()) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            return ExitCode::FAILURE;
        }
    };

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("cat@10,20"), Ok(("cat".to_string(), 10, 20)));
        assert_eq!(parse_point("a@b@3,4"), Ok(("a@b".to_string(), 3, 4)));
        assert!(parse_point("cat").is_err());
        assert!(parse_point("cat@1").is_err());
        assert!(parse_point("cat@x,2").is_err());
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&[
            "in.png",
            "out.json",
            "--edges",
            "2",
            "0.1",
            "0.3",
            "--overlay",
            "o.png",
            "dog@5,6",
        ]))
        .unwrap();
        assert_eq!(parsed.image, PathBuf::from("in.png"));
        assert!(matches!(parsed.params, Some(ExtractionParams::Edge(_))));
        assert_eq!(parsed.overlay, Some(PathBuf::from("o.png")));
        assert_eq!(parsed.points, vec![("dog".to_string(), 5, 6)]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["in.png"])).is_err());
        assert!(parse_args(args(&["in.png", "out.json", "--superpixels"])).is_err());
        assert!(parse_args(args(&["in.png", "out.json", "--superpixels", "many"])).is_err());
    }
}
