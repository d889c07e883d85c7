//! The `autograph` command line: render stored strokes to an image file.

use crate::config::{ConfigError, FieldConfig, Theme};
use autograph_core::{CssColor, DocumentError, StrokeRecord};
use autograph_render::{ExportFormat, RasterFormat, RendererError, SignaturePad};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default drawing area, the size of an unstyled HTML canvas.
const DEFAULT_WIDTH: f64 = 300.0;
const DEFAULT_HEIGHT: f64 = 150.0;

pub const USAGE: &str = "usage: autograph render <strokes.json> <output.(png|jpg|svg)> \
[--config <file>] [--width <px>] [--height <px>] [--ratio <n>] [--no-background]";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("Failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid strokes file: {0}")]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

/// Arguments of `autograph render`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub width: f64,
    pub height: f64,
    pub ratio: f64,
    pub include_background: bool,
}

impl RenderArgs {
    /// Parse everything after the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        match args.next().as_deref() {
            Some("render") => {}
            Some(other) => return Err(CliError::Usage(format!("unknown command `{}`", other))),
            None => return Err(CliError::Usage("missing command".to_string())),
        }

        let mut positional = Vec::new();
        let mut config = None;
        let mut width = DEFAULT_WIDTH;
        let mut height = DEFAULT_HEIGHT;
        let mut ratio = 1.0;
        let mut include_background = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(value_of(&arg, args.next())?)),
                "--width" => width = number_of(&arg, args.next())?,
                "--height" => height = number_of(&arg, args.next())?,
                "--ratio" => ratio = number_of(&arg, args.next())?,
                "--no-background" => include_background = false,
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option `{}`", flag)));
                }
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        let [input, output]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| CliError::Usage("expected an input and an output path".to_string()))?;

        Ok(Self {
            input,
            output,
            config,
            width,
            height,
            ratio,
            include_background,
        })
    }

    /// Output format from the output file extension.
    pub fn format(&self) -> Result<ExportFormat, CliError> {
        let extension = self
            .output
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("png") => Ok(ExportFormat::Raster(RasterFormat::Png)),
            Some("jpg") | Some("jpeg") => Ok(ExportFormat::Raster(RasterFormat::Jpeg { quality: None })),
            Some("svg") => Ok(ExportFormat::Svg {
                include_background: self.include_background,
            }),
            _ => Err(CliError::Usage(format!(
                "cannot tell the output format of {}",
                self.output.display()
            ))),
        }
    }
}

fn value_of(flag: &str, value: Option<String>) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("{} needs a value", flag)))
}

fn number_of(flag: &str, value: Option<String>) -> Result<f64, CliError> {
    let value = value_of(flag, value)?;
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number > 0.0 => Ok(number),
        _ => Err(CliError::Usage(format!("{} needs a positive number, got `{}`", flag, value))),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the strokes file and write the output file.
pub fn run(args: &RenderArgs) -> Result<(), CliError> {
    let format = args.format()?;
    let config = match &args.config {
        Some(path) => FieldConfig::from_json(&read(path)?)?,
        None => FieldConfig::default(),
    };

    let records: Vec<StrokeRecord> =
        serde_json::from_str(&read(&args.input)?).map_err(DocumentError::from)?;
    log::info!("rendering {} strokes from {}", records.len(), args.input.display());

    let mut pad = SignaturePad::new(config.pad_options(Theme::Light), args.width, args.height, args.ratio);
    pad.from_data(records);

    let mut colors = config.export_colors();
    if !args.include_background {
        colors.background = Some(CssColor::transparent());
    }
    let bytes = pad.export(format, &colors)?;

    std::fs::write(&args.output, &bytes).map_err(|source| CliError::Io {
        path: args.output.clone(),
        source,
    })?;
    log::info!("wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}
