//! Per-image annotation store.
//!
//! Keys are image paths, the stable external identity of an image. A key,
//! once created, stays in the store until [`AnnotationStore::clear`], even
//! when its list becomes empty.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::Sender;

use crate::model::{Annotation, AnnotationId};

/// Change notification emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added {
        image_path: String,
        id: AnnotationId,
        label: String,
    },
    Removed {
        image_path: String,
        id: AnnotationId,
    },
    Cleared,
}

/// Receives store mutations. All methods default to no-ops.
pub trait StoreObserver {
    fn on_annotation_added(&self, _image_path: &str, _annotation: &Annotation) {}

    fn on_annotation_removed(&self, _image_path: &str, _id: AnnotationId) {}

    fn on_store_cleared(&self) {}
}

impl StoreObserver for Sender<StoreEvent> {
    fn on_annotation_added(&self, image_path: &str, annotation: &Annotation) {
        send_event(
            self,
            StoreEvent::Added {
                image_path: image_path.to_string(),
                id: annotation.id(),
                label: annotation.label().to_string(),
            },
        );
    }

    fn on_annotation_removed(&self, image_path: &str, id: AnnotationId) {
        send_event(
            self,
            StoreEvent::Removed {
                image_path: image_path.to_string(),
                id,
            },
        );
    }

    fn on_store_cleared(&self) {
        send_event(self, StoreEvent::Cleared);
    }
}

fn send_event(sender: &Sender<StoreEvent>, event: StoreEvent) {
    if sender.send(event).is_err() {
        log::trace!("Store event receiver dropped");
    }
}

/// Annotations and metadata of one image.
#[derive(Debug, Clone, Default)]
struct ImageEntry {
    annotations: Vec<Annotation>,
    dimensions: Option<(u32, u32)>,
    /// Highest id ever added for this image; never decreases.
    last_id: AnnotationId,
}

/// Image path -> ordered annotation list.
#[derive(Default)]
pub struct AnnotationStore {
    images: BTreeMap<String, ImageEntry>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("images", &self.images)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for subsequent mutations.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    /// Append `annotation` to the list of `image_path`, creating the key if
    /// absent. Id uniqueness is the caller's responsibility; see
    /// [`AnnotationStore::next_id`].
    pub fn add(&mut self, image_path: &str, annotation: Annotation) {
        let entry = self.images.entry(image_path.to_string()).or_default();
        entry.last_id = entry.last_id.max(annotation.id());
        log::debug!(
            "Added annotation {} '{}' to {}",
            annotation.id(),
            annotation.label(),
            image_path
        );
        for observer in &self.observers {
            observer.on_annotation_added(image_path, &annotation);
        }
        entry.annotations.push(annotation);
    }

    /// Remove annotation `id` from `image_path`. The key is kept even if
    /// its list becomes empty.
    ///
    /// Returns `true` if an annotation was removed.
    pub fn remove_by_id(&mut self, image_path: &str, id: AnnotationId) -> bool {
        let Some(entry) = self.images.get_mut(image_path) else {
            return false;
        };
        let before = entry.annotations.len();
        entry.annotations.retain(|ann| ann.id() != id);
        let removed = entry.annotations.len() != before;

        if removed {
            log::debug!("Removed annotation {} from {}", id, image_path);
            for observer in &self.observers {
                observer.on_annotation_removed(image_path, id);
            }
        }
        removed
    }

    /// Annotations of `image_path`; empty for unknown keys.
    pub fn get(&self, image_path: &str) -> &[Annotation] {
        self.images
            .get(image_path)
            .map(|entry| entry.annotations.as_slice())
            .unwrap_or(&[])
    }

    /// Every key with its list, in sorted path order.
    pub fn get_all(&self) -> impl Iterator<Item = (&str, &[Annotation])> + '_ {
        self.images
            .iter()
            .map(|(path, entry)| (path.as_str(), entry.annotations.as_slice()))
    }

    pub fn contains_image(&self, image_path: &str) -> bool {
        self.images.contains_key(image_path)
    }

    /// Remove every key and annotation.
    pub fn clear(&mut self) {
        self.images.clear();
        log::debug!("Cleared annotation store");
        for observer in &self.observers {
            observer.on_store_cleared();
        }
    }

    /// Id for the next annotation of `image_path`.
    ///
    /// One more than the highest id ever added for that image, so ids are
    /// not reused after deletion.
    pub fn next_id(&self, image_path: &str) -> AnnotationId {
        self.images
            .get(image_path)
            .map_or(0, |entry| entry.last_id)
            + 1
    }

    /// Record the pixel dimensions of `image_path`, creating the key if
    /// absent.
    pub fn set_dimensions(&mut self, image_path: &str, width: u32, height: u32) {
        self.images
            .entry(image_path.to_string())
            .or_default()
            .dimensions = Some((width, height));
    }

    pub fn dimensions(&self, image_path: &str) -> Option<(u32, u32)> {
        self.images.get(image_path).and_then(|entry| entry.dimensions)
    }

    /// Move the entry of `from` to `to`. Does nothing and returns `false`
    /// when `from` is unknown or `to` already exists.
    pub fn rename_image(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.images.contains_key(to) {
            return false;
        }
        match self.images.remove(from) {
            Some(entry) => {
                log::debug!("Renamed store key {} -> {}", from, to);
                self.images.insert(to.to_string(), entry);
                true
            }
            None => false,
        }
    }

    pub fn total_annotations(&self) -> usize {
        self.images.values().map(|entry| entry.annotations.len()).sum()
    }

    /// Replace the contents with those of `other`, keeping this store's
    /// observers. Observers see a clear followed by one add per annotation.
    pub fn replace_with(&mut self, other: AnnotationStore) {
        self.clear();
        self.images = other.images;
        for (path, entry) in &self.images {
            for annotation in &entry.annotations {
                for observer in &self.observers {
                    observer.on_annotation_added(path, annotation);
                }
            }
        }
    }
}
