//! Writing scenes out as files, a TSV report, or a ZIP archive.
//!
//! Every file is written to a temporary sibling first and renamed into
//! place once complete, so a failed export never leaves a truncated file
//! under its final name.
//!
//! # Example
//!
//! ```no_run
//! use scenecut::{ExportService, SceneCatalog};
//!
//! # fn example(catalog: &SceneCatalog) -> Result<(), scenecut::ExportError> {
//! let export = ExportService::new();
//! export.export_tsv(catalog, "out", "holiday")?;
//! export.export_archive(catalog.selected(), "out/holiday_scenes.zip")?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{error::ExportError, scene::Scene};

/// Byte-order mark prefixed to every report.
const BOM: char = '\u{feff}';

/// Header row of the TSV report.
pub const TSV_HEADER: &str = "sceneNumber\ttimestampFormatted\tdescription\ttags";

/// Separator between tags inside the tags column.
const TAG_SEPARATOR: &str = ", ";

/// One data row of a TSV report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRecord {
    /// 1-based scene number.
    pub scene_number: u32,
    /// `MM:SS`.
    pub timestamp_formatted: String,
    /// Analysis description, empty when the scene was not analyzed.
    pub description: String,
    /// Analysis tags, empty when the scene was not analyzed.
    pub tags: Vec<String>,
}

impl TsvRecord {
    /// The row a scene is written as.
    pub fn from_scene(scene: &Scene) -> Self {
        let (description, tags) = match &scene.analysis {
            Some(analysis) => (
                sanitize_field(&analysis.description),
                analysis
                    .tags
                    .iter()
                    .map(|tag| sanitize_field(tag))
                    .collect::<Vec<_>>(),
            ),
            None => (String::new(), Vec::new()),
        };
        Self {
            scene_number: scene.scene_number,
            timestamp_formatted: scene.timestamp_formatted(),
            description,
            tags,
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.scene_number,
            self.timestamp_formatted,
            self.description,
            self.tags.join(TAG_SEPARATOR)
        )
    }
}

/// Serializes scenes to files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportService;

impl ExportService {
    /// Create an export service.
    pub fn new() -> Self {
        Self
    }

    /// File name for one scene: `scene_{n}_{MM-SS}.jpg`.
    ///
    /// ```
    /// # use scenecut::{ExportService, Scene, Thumbnail};
    /// let thumbnail = Thumbnail { data: Vec::new(), width: 1, height: 1 };
    /// let scene = Scene::new(7, 88.5, thumbnail);
    /// assert_eq!(ExportService::scene_file_name(&scene), "scene_7_01-28.jpg");
    /// ```
    pub fn scene_file_name(scene: &Scene) -> String {
        format!(
            "scene_{}_{}.jpg",
            scene.scene_number,
            scene.timestamp_formatted().replace(':', "-")
        )
    }

    /// File name for a report: `{base_name}_scenes.tsv`.
    pub fn tsv_file_name(base_name: &str) -> String {
        format!("{base_name}_scenes.tsv")
    }

    /// Write one scene's thumbnail into `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn export_single(
        &self,
        scene: &Scene,
        directory: impl AsRef<Path>,
    ) -> Result<PathBuf, ExportError> {
        let path = directory.as_ref().join(Self::scene_file_name(scene));
        write_atomically(&path, |file| Ok(file.write_all(&scene.thumbnail.data)?))?;
        log::debug!("Wrote scene {} to {}", scene.scene_number, path.display());
        Ok(path)
    }

    /// Render the TSV report: BOM, header, then one row per scene in the
    /// given order, rows joined with `\n`.
    ///
    /// Tabs and line breaks inside descriptions or tags are replaced with a
    /// space so each scene stays on one line.
    pub fn tsv_report<'a, I>(&self, scenes: I) -> String
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        let mut report = String::new();
        report.push(BOM);
        report.push_str(TSV_HEADER);
        for scene in scenes {
            report.push('\n');
            report.push_str(&TsvRecord::from_scene(scene).to_line());
        }
        report
    }

    /// Write the TSV report to `{directory}/{base_name}_scenes.tsv`.
    ///
    /// # Errors
    ///
    /// - [`ExportError::NothingToExport`] if `scenes` is empty.
    /// - [`ExportError::Io`] if the file cannot be written.
    pub fn export_tsv<'a, I>(
        &self,
        scenes: I,
        directory: impl AsRef<Path>,
        base_name: &str,
    ) -> Result<PathBuf, ExportError>
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        let scenes: Vec<&Scene> = scenes.into_iter().collect();
        if scenes.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let report = self.tsv_report(scenes.iter().copied());
        let path = directory.as_ref().join(Self::tsv_file_name(base_name));
        write_atomically(&path, |file| Ok(file.write_all(report.as_bytes())?))?;

        log::info!("Wrote report for {} scene(s) to {}", scenes.len(), path.display());
        Ok(path)
    }

    /// Parse a report produced by [`tsv_report`](ExportService::tsv_report).
    ///
    /// The BOM is optional; blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MalformedReport`] if the header is missing or
    /// a row does not have four fields and a numeric scene number.
    pub fn parse_tsv(report: &str) -> Result<Vec<TsvRecord>, ExportError> {
        let report = report.strip_prefix(BOM).unwrap_or(report);
        let mut lines = report.lines().enumerate();

        match lines.next() {
            Some((_, header)) if header == TSV_HEADER => {}
            _ => {
                return Err(ExportError::MalformedReport {
                    line: 1,
                    reason: "missing header row".to_string(),
                });
            }
        }

        let mut records = Vec::new();
        for (index, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |reason: String| ExportError::MalformedReport {
                line: index + 1,
                reason,
            };

            let fields: Vec<&str> = line.split('\t').collect();
            let [number, timestamp, description, tags] = fields.as_slice() else {
                return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
            };
            let scene_number = number
                .parse::<u32>()
                .map_err(|error| malformed(format!("invalid scene number {number:?}: {error}")))?;

            records.push(TsvRecord {
                scene_number,
                timestamp_formatted: (*timestamp).to_string(),
                description: (*description).to_string(),
                tags: tags
                    .split(TAG_SEPARATOR)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect(),
            });
        }

        Ok(records)
    }

    /// Write the scenes' thumbnails into one ZIP archive at `path`, entries
    /// named as by [`scene_file_name`](ExportService::scene_file_name), in
    /// the given order.
    ///
    /// # Errors
    ///
    /// - [`ExportError::NothingToExport`] if `scenes` is empty.
    /// - [`ExportError::Archive`] / [`ExportError::Io`] if writing fails.
    pub fn export_archive<'a, I>(
        &self,
        scenes: I,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, ExportError>
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        let scenes: Vec<&Scene> = scenes.into_iter().collect();
        if scenes.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let path = path.as_ref().to_path_buf();
        write_atomically(&path, |file| {
            let mut archive = ZipWriter::new(file);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            for scene in &scenes {
                archive.start_file(Self::scene_file_name(scene), options)?;
                archive.write_all(&scene.thumbnail.data)?;
            }

            archive.finish()?;
            Ok(())
        })?;

        log::info!("Archived {} scene(s) to {}", scenes.len(), path.display());
        Ok(path)
    }

    /// Write each scene's thumbnail into `directory`, one file per scene,
    /// in the given order. The directory is created if missing.
    ///
    /// # Errors
    ///
    /// - [`ExportError::NothingToExport`] if `scenes` is empty.
    /// - [`ExportError::Io`] on the first file that cannot be written.
    pub fn export_directory<'a, I>(
        &self,
        scenes: I,
        directory: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, ExportError>
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        let directory = directory.as_ref();
        let scenes: Vec<&Scene> = scenes.into_iter().collect();
        if scenes.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        std::fs::create_dir_all(directory)?;
        scenes
            .into_iter()
            .map(|scene| self.export_single(scene, directory))
            .collect()
    }
}

fn sanitize_field(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Write `path` through a temporary file in the same directory, renaming it
/// into place only after `write` succeeds.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut File) -> Result<(), ExportError>,
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temporary = NamedTempFile::new_in(directory)?;
    write(temporary.as_file_mut())?;
    temporary.as_file_mut().flush()?;
    temporary
        .persist(path)
        .map_err(|error| ExportError::Io(error.error))?;
    Ok(())
}
