use std::collections::BTreeSet;

use super::{AssetCategory, FileType};

/// Model extensions (lowercase, with dot).
pub const MODEL_EXTENSIONS: [&str; 7] = [".fbx", ".obj", ".gltf", ".glb", ".ma", ".mb", ".blend"];
/// Image and texture extensions.
pub const IMAGE_EXTENSIONS: [&str; 8] = [
    ".png", ".jpg", ".jpeg", ".tga", ".tif", ".tiff", ".bmp", ".psd",
];
/// Audio extensions.
pub const AUDIO_EXTENSIONS: [&str; 3] = [".mp3", ".wav", ".ogg"];
/// Video extensions.
pub const VIDEO_EXTENSIONS: [&str; 2] = [".mp4", ".webm"];

/// Result of classifying a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub file_type: FileType,
    pub category: AssetCategory,
}

/// Maps filenames to asset categories and decides which files are kept.
///
/// The four category sets are fixed; the allow-list is their union plus any
/// configured extra extensions, which are kept but stay unclassified.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    extra_allowed: BTreeSet<FileType>,
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self {
            extra_allowed: BTreeSet::new(),
        }
    }
}

impl ExtensionClassifier {
    /// Build a classifier that additionally accepts the given extensions.
    pub fn with_extra_allowed<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra_allowed: extra
                .into_iter()
                .map(|ext| FileType::from_extension(ext.as_ref()))
                .filter(|ext| ext.as_str().len() > 1)
                .collect(),
        }
    }

    /// Classify a filename by the text after its last dot.
    ///
    /// Names without a dot get the no-extension sentinel.
    pub fn classify(&self, filename: &str) -> Classification {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Classification {
                file_type: FileType::none(),
                category: AssetCategory::Unclassified,
            };
        };
        let file_type = FileType::from_extension(ext);
        let category = category_for(&file_type);
        Classification {
            file_type,
            category,
        }
    }

    /// Category of an already normalized file type.
    pub fn category_of(&self, file_type: &FileType) -> AssetCategory {
        category_for(file_type)
    }

    /// True when a file of this type belongs in the accepted set.
    pub fn is_accepted(&self, file_type: &FileType) -> bool {
        if file_type.is_none() {
            return false;
        }
        category_for(file_type) != AssetCategory::Unclassified
            || self.extra_allowed.contains(file_type)
    }
}

/// Category lookup against the four fixed extension sets.
pub(crate) fn category_for(file_type: &FileType) -> AssetCategory {
    let ext = file_type.as_str();
    if MODEL_EXTENSIONS.contains(&ext) {
        AssetCategory::Model
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        AssetCategory::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        AssetCategory::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        AssetCategory::Video
    } else {
        AssetCategory::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_last_extension_case_insensitively() {
        let classifier = ExtensionClassifier::default();
        let result = classifier.classify("Hero.Rig.FBX");
        assert_eq!(result.file_type.as_str(), ".fbx");
        assert_eq!(result.category, AssetCategory::Model);
        assert_eq!(
            classifier.classify("skin.png").category,
            AssetCategory::Image
        );
        assert_eq!(classifier.classify("hit.ogg").category, AssetCategory::Audio);
        assert_eq!(classifier.classify("intro.webm").category, AssetCategory::Video);
    }

    #[test]
    fn names_without_extension_are_unclassified_and_skipped() {
        let classifier = ExtensionClassifier::default();
        let result = classifier.classify("Makefile");
        assert!(result.file_type.is_none());
        assert_eq!(result.category, AssetCategory::Unclassified);
        assert!(!classifier.is_accepted(&result.file_type));
    }

    #[test]
    fn trailing_dot_and_unknown_extensions_are_not_accepted() {
        let classifier = ExtensionClassifier::default();
        let trailing = classifier.classify("notes.");
        assert_eq!(trailing.file_type.as_str(), ".");
        assert!(!classifier.is_accepted(&trailing.file_type));
        let text = classifier.classify("readme.txt");
        assert_eq!(text.category, AssetCategory::Unclassified);
        assert!(!classifier.is_accepted(&text.file_type));
    }

    #[test]
    fn extra_allowed_types_are_kept_but_unclassified() {
        let classifier = ExtensionClassifier::with_extra_allowed(["USD", ".exr", ""]);
        let usd = classifier.classify("scene.usd");
        assert_eq!(usd.category, AssetCategory::Unclassified);
        assert!(classifier.is_accepted(&usd.file_type));
        assert!(classifier.is_accepted(&FileType::from_extension("exr")));
        assert!(!classifier.is_accepted(&FileType::from_extension("txt")));
    }
}
