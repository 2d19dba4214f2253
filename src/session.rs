//! Annotation session: the state one user works on.
//!
//! The session owns the loaded image and every derived cache (boundary
//! mask, label grid, selection). Derived state is recomputed eagerly, so a
//! label grid and a selection made against an older grid never coexist:
//! every relabel clears the selection before returning.

use std::path::Path;

use image::RgbImage;
use segannot_raster::{
    BoundaryMask, Connectivity, ExtractionParams, LabelGrid, ManualCut, RegionId,
    extract_boundaries, label_regions, region_at, region_count, union_mask,
};

use crate::builder::build_annotation;
use crate::config::AnnotatorConfig;
use crate::constants::THUMBNAIL_SIZE;
use crate::error::{AnnotateError, Result};
use crate::format::{CocoDocument, CocoFormat};
use crate::loader::{SourceImage, load_image};
use crate::model::{Annotation, AnnotationId, SelectionSet};
use crate::render::{self, AnnotationSummary, CompositeLayers};
use crate::store::{AnnotationStore, StoreObserver};
use crate::viewport::DisplayMapping;


/// Result of a click on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The region was added to the selection.
    Selected(RegionId),
    /// The region was removed from the selection.
    Deselected(RegionId),
    /// Outside the image, on a boundary pixel, or no regions yet.
    Ignored,
}

/// Interactive annotation state for one image at a time, plus the store of
/// every image annotated so far.
#[derive(Debug)]
pub struct Session {
    config: AnnotatorConfig,
    image: Option<SourceImage>,
    params: ExtractionParams,
    stroke_width: u32,
    connectivity: Connectivity,
    boundary: Option<BoundaryMask>,
    cuts: Vec<ManualCut>,
    /// Points of the stroke being drawn; `None` outside a drag gesture.
    stroke: Option<Vec<(i32, i32)>>,
    labels: Option<LabelGrid>,
    selection: SelectionSet,
    store: AnnotationStore,
    /// Message shown instead of the boundary overlay after a failure.
    status: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default())
    }
}

impl Session {
    pub fn new(config: AnnotatorConfig) -> Self {
        let params = config.extraction.clamped().to_params();
        let stroke_width = config.clamped_stroke_width();
        let connectivity = config.connectivity.into();
        Self {
            config,
            image: None,
            params,
            stroke_width,
            connectivity,
            boundary: None,
            cuts: Vec::new(),
            stroke: None,
            labels: None,
            selection: SelectionSet::new(),
            store: AnnotationStore::new(),
            status: None,
        }
    }

    // --- Image -----------------------------------------------------------

    /// Load the image at `path` and extract its regions.
    ///
    /// On a read or decode failure the session is left unchanged.
    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = load_image(path)?;
        self.set_image(image)
    }

    /// Replace the current image. Cuts, stroke and selection are dropped and
    /// the regions are recomputed with the current parameters.
    pub fn set_image(&mut self, image: SourceImage) -> Result<()> {
        let (width, height) = image.dimensions();
        self.store.set_dimensions(&image.path, width, height);
        log::info!("Annotating {} ({}x{})", image.path, width, height);

        self.image = Some(image);
        self.cuts.clear();
        self.stroke = None;
        self.boundary = None;
        self.labels = None;
        self.selection.clear();
        self.status = None;

        let params = self.params;
        self.apply_params(params)
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.path.as_str())
    }

    // --- Extraction ------------------------------------------------------

    /// Change the extraction parameters and recompute the regions.
    ///
    /// Rejected parameters leave boundaries, regions and selection as they
    /// were; the error message is kept in [`Session::status`].
    pub fn set_params(&mut self, params: ExtractionParams) -> Result<()> {
        self.apply_params(params)
    }

    fn apply_params(&mut self, params: ExtractionParams) -> Result<()> {
        let extracted = match (&self.image, &params) {
            (Some(image), _) => extract_boundaries(&image.pixels, &params).map(Some),
            (None, ExtractionParams::Edge(edge)) => edge.validate().map(|()| None),
            (None, ExtractionParams::Superpixel(_)) => Ok(None),
        };

        match extracted {
            Ok(boundary) => {
                self.params = params;
                self.status = None;
                if boundary.is_some() {
                    self.boundary = boundary;
                    self.relabel();
                }
                Ok(())
            }
            Err(err) => {
                let err = AnnotateError::from(err);
                log::warn!("{}", err);
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Width of manual cut strokes; relabels when it changes.
    pub fn set_stroke_width(&mut self, stroke_width: u32) {
        if self.stroke_width != stroke_width {
            self.stroke_width = stroke_width;
            self.relabel();
        }
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    /// Region growing neighbourhood; relabels when it changes.
    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        if self.connectivity != connectivity {
            self.connectivity = connectivity;
            self.relabel();
        }
    }

    /// Recompute the label grid from the boundary mask and cuts, and clear
    /// the selection. Does nothing before the first successful extraction.
    fn relabel(&mut self) {
        self.selection.clear();
        let Some(boundary) = &self.boundary else {
            return;
        };
        let labels = label_regions(boundary, &self.cuts, self.stroke_width, self.connectivity);
        log::debug!("{} regions after relabel", region_count(&labels));
        self.labels = Some(labels);
    }

    pub fn boundary(&self) -> Option<&BoundaryMask> {
        self.boundary.as_ref()
    }

    pub fn labels(&self) -> Option<&LabelGrid> {
        self.labels.as_ref()
    }

    /// Message describing the last failed extraction, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // --- Manual cuts -----------------------------------------------------

    /// Start a drag gesture at source pixel `(x, y)`, discarding any
    /// unfinished stroke.
    pub fn begin_stroke(&mut self, x: i32, y: i32) {
        self.stroke = Some(vec![(x, y)]);
    }

    /// Append a point to the stroke being drawn. Ignored outside a gesture
    /// and for repeats of the last point.
    pub fn extend_stroke(&mut self, x: i32, y: i32) {
        let Some(points) = &mut self.stroke else {
            return;
        };
        if points.last() != Some(&(x, y)) {
            points.push((x, y));
        }
    }

    /// Finish the gesture. A stroke with at least two points becomes a
    /// committed cut and the regions are relabelled.
    ///
    /// Returns `true` if a cut was committed.
    pub fn end_stroke(&mut self) -> bool {
        let Some(points) = self.stroke.take() else {
            return false;
        };
        match ManualCut::new(points) {
            Some(cut) => {
                log::debug!("Committed manual cut with {} points", cut.points().len());
                self.cuts.push(cut);
                self.relabel();
                true
            }
            None => {
                log::debug!("Discarded stroke with fewer than two points");
                false
            }
        }
    }

    /// [`Session::begin_stroke`] for a point in display coordinates. A
    /// gesture has to start on the image; returns `false` otherwise.
    pub fn begin_stroke_display(&mut self, mapping: &DisplayMapping, x: f32, y: f32) -> bool {
        match mapping.to_source(x, y) {
            Some((sx, sy)) => {
                self.begin_stroke(sx as i32, sy as i32);
                true
            }
            None => false,
        }
    }

    /// [`Session::extend_stroke`] for a point in display coordinates.
    /// Points off the image are clamped to its edge.
    pub fn extend_stroke_display(&mut self, mapping: &DisplayMapping, x: f32, y: f32) {
        if let Some((sx, sy)) = mapping.to_source_clamped(x, y) {
            self.extend_stroke(sx, sy);
        }
    }

    /// Drop the stroke being drawn without committing it.
    pub fn cancel_stroke(&mut self) {
        self.stroke = None;
    }

    /// Points of the stroke being drawn.
    pub fn stroke_points(&self) -> &[(i32, i32)] {
        self.stroke.as_deref().unwrap_or(&[])
    }

    pub fn cuts(&self) -> &[ManualCut] {
        &self.cuts
    }

    /// Remove the cut at `index` and relabel. Out-of-range indices are
    /// ignored.
    pub fn remove_cut(&mut self, index: usize) -> bool {
        if index >= self.cuts.len() {
            return false;
        }
        self.cuts.remove(index);
        self.relabel();
        true
    }

    // --- Selection -------------------------------------------------------

    /// Toggle the region under source pixel `(x, y)`.
    pub fn click(&mut self, x: i64, y: i64) -> ClickOutcome {
        let Some(id) = self
            .labels
            .as_ref()
            .and_then(|labels| region_at(labels, x, y))
        else {
            return ClickOutcome::Ignored;
        };
        if self.selection.toggle(id) {
            ClickOutcome::Selected(id)
        } else {
            ClickOutcome::Deselected(id)
        }
    }

    /// [`Session::click`] for a point in display coordinates.
    pub fn click_display(&mut self, mapping: &DisplayMapping, x: f32, y: f32) -> ClickOutcome {
        match mapping.to_source(x, y) {
            Some((sx, sy)) => self.click(i64::from(sx), i64::from(sy)),
            None => ClickOutcome::Ignored,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- Annotations -----------------------------------------------------

    /// Build an annotation from the selected regions and add it to the
    /// store. The selection is cleared on success.
    pub fn add_annotation(&mut self, label: &str) -> Result<AnnotationId> {
        let image_path = self.image_path().ok_or(AnnotateError::NoImage)?.to_string();
        if self.config.require_label && label.trim().is_empty() {
            return Err(AnnotateError::MissingLabel);
        }
        let labels = match &self.labels {
            Some(labels) if !self.selection.is_empty() => labels,
            _ => return Err(AnnotateError::EmptySelection),
        };

        let mask = union_mask(labels, self.selection.ids());
        let id = self.store.next_id(&image_path);
        let annotation = build_annotation(&mask, label, id)?;

        self.store.add(&image_path, annotation);
        self.selection.clear();
        Ok(id)
    }

    /// Remove annotation `id` of the current image.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        match self.image.as_ref() {
            Some(image) => self.store.remove_by_id(&image.path, id),
            None => false,
        }
    }

    /// Annotations of the current image.
    pub fn annotations(&self) -> &[Annotation] {
        self.image_path()
            .map(|path| self.store.get(path))
            .unwrap_or(&[])
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Register an observer on the annotation store.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.store.subscribe(observer);
    }

    // --- Presentation ----------------------------------------------------

    /// Image with boundaries, cuts and the selection drawn in.
    ///
    /// Boundaries are left out while [`Session::status`] reports a failure.
    pub fn composite(&self) -> Option<RgbImage> {
        let image = self.image.as_ref()?;
        let layers = CompositeLayers {
            boundary: self.boundary.as_ref().filter(|_| self.status.is_none()),
            labels: self.labels.as_ref(),
            selection: &self.selection,
            cuts: &self.cuts,
            stroke: self.stroke_points(),
            stroke_width: self.stroke_width,
        };
        Some(render::composite(&image.pixels, &layers, &self.config.colors))
    }

    /// Image with the current image's annotations overlaid.
    pub fn overlay(&self) -> Option<RgbImage> {
        let image = self.image.as_ref()?;
        Some(render::overlay(
            &image.pixels,
            self.annotations(),
            self.config.colors.overlay_alpha,
        ))
    }

    /// List rows for the current image's annotations.
    pub fn summaries(&self) -> Vec<AnnotationSummary> {
        match &self.image {
            Some(image) => render::summaries(self.annotations(), image.width(), image.height()),
            None => Vec::new(),
        }
    }

    /// Thumbnail of annotation `id` of the current image, fitted to
    /// `max_side` or [`THUMBNAIL_SIZE`] when `None`.
    pub fn thumbnail(&self, id: AnnotationId, max_side: Option<u32>) -> Option<RgbImage> {
        let image = self.image.as_ref()?;
        let annotation = self.annotations().iter().find(|ann| ann.id() == id)?;
        let max_side = max_side.unwrap_or(THUMBNAIL_SIZE);
        Some(render::thumbnail(&image.pixels, annotation, max_side))
    }

    // --- Persistence -----------------------------------------------------

    /// COCO document of the whole store, current image first.
    pub fn export_document(&self) -> Result<CocoDocument> {
        let image = self.image.as_ref().ok_or(AnnotateError::NoImage)?;
        Ok(CocoFormat::export_all(
            &image.path,
            image.dimensions(),
            &self.store,
        ))
    }

    /// Pretty-printed COCO JSON of the whole store.
    pub fn export_json_string(&self) -> Result<String> {
        Ok(CocoFormat::to_json_string(&self.export_document()?)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        CocoFormat::export(&self.export_document()?, path)?;
        Ok(())
    }

    /// Replace the store with the contents of the COCO file at `path`.
    ///
    /// Imported keys are file names. The entry matching the current image's
    /// file name is moved to the current image's key. On failure the store
    /// is left unchanged.
    pub fn load_json(&mut self, path: &Path) -> Result<()> {
        let doc = CocoFormat::import(path)?;
        let mut imported = CocoFormat::import_all(&doc)?;

        if let Some(image) = &self.image {
            let file_name = Path::new(&image.path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            if let Some(file_name) = file_name {
                imported.rename_image(&file_name, &image.path);
            }
            let (width, height) = image.dimensions();
            imported.set_dimensions(&image.path, width, height);
        }

        self.store.replace_with(imported);
        Ok(())
    }
}
