//! Record - one source image and its annotation
//!
//! A Record is the unit of data in its original, unprocessed form. It is
//! immutable once captured, and its image and annotation share a stem.

use crate::error::RecordError;
use std::path::{Path, PathBuf};

/// An image/annotation pair from a CVAT export
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    image_path: PathBuf,
    annotation_path: PathBuf,
    stem: String,
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

impl Record {
    /// Pair an image with its annotation; both file stems must be equal
    pub fn new(
        image_path: impl Into<PathBuf>,
        annotation_path: impl Into<PathBuf>,
    ) -> Result<Self, RecordError> {
        let image_path = image_path.into();
        let annotation_path = annotation_path.into();

        let stem = match (stem_of(&image_path), stem_of(&annotation_path)) {
            (Some(image_stem), Some(annotation_stem)) if image_stem == annotation_stem => image_stem,
            _ => {
                return Err(RecordError::StemMismatch {
                    image: image_path,
                    annotation: annotation_path,
                })
            }
        };

        Ok(Self {
            image_path,
            annotation_path,
            stem,
        })
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn annotation_path(&self) -> &Path {
        &self.annotation_path
    }

    /// File name without extension, shared by image and annotation
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record =
            Record::new("raw/task_1/default/test_image_0.png", "raw/task_1/default/test_image_0.xml")
                .unwrap();

        assert_eq!(record.image_path(), Path::new("raw/task_1/default/test_image_0.png"));
        assert_eq!(record.annotation_path(), Path::new("raw/task_1/default/test_image_0.xml"));
        assert_eq!(record.stem(), "test_image_0");
    }

    #[test]
    fn test_record_stem_keeps_inner_dots() {
        let record = Record::new("RG1.v2.png", "RG1.v2.xml").unwrap();
        assert_eq!(record.stem(), "RG1.v2");
    }

    #[test]
    fn test_record_rejects_mismatched_stems() {
        let err = Record::new("x/a.png", "x/b.xml").unwrap_err();
        assert!(matches!(
            err,
            RecordError::StemMismatch { ref image, ref annotation }
                if image == Path::new("x/a.png") && annotation == Path::new("x/b.xml")
        ));
    }

    #[test]
    fn test_record_rejects_missing_file_name() {
        assert!(Record::new("", "a.xml").is_err());
        assert!(Record::new("raw/..", "raw/...xml").is_err());
    }
}
