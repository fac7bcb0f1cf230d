//! Extension bucket rule
//!
//! A file's bucket is the text after the last `.` of its name, case
//! preserved. Names without a usable extension go to the no-extension bucket.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension of a file name with the leading dot stripped.
///
/// Returns `None` for `README`, `.bashrc` and `notes.`.
pub fn extension_key(path: &Path) -> Option<&OsStr> {
    path.extension().filter(|ext| !ext.is_empty())
}

/// Maps source files to their place in the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLayout {
    output_root: PathBuf,
    no_ext_bucket: String,
}

impl BucketLayout {
    /// Create a layout rooted at `output_root`
    pub fn new(output_root: impl Into<PathBuf>, no_ext_bucket: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            no_ext_bucket: no_ext_bucket.into(),
        }
    }

    /// Root of all buckets
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Bucket folder for a source file
    pub fn bucket_dir(&self, source: &Path) -> PathBuf {
        match extension_key(source) {
            Some(ext) => self.output_root.join(ext),
            None => self.output_root.join(&self.no_ext_bucket),
        }
    }

    /// Final destination of a source file, `None` when the path has no file name
    pub fn destination_for(&self, source: &Path) -> Option<PathBuf> {
        let name = source.file_name()?;
        Some(self.bucket_dir(source).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout() -> BucketLayout {
        BucketLayout::new("dist", "noext")
    }

    #[test]
    fn test_extension_key() {
        assert_eq!(extension_key(Path::new("a.txt")), Some(OsStr::new("txt")));
        assert_eq!(extension_key(Path::new("sub/b.tar.gz")), Some(OsStr::new("gz")));
        assert_eq!(extension_key(Path::new("Logo.PNG")), Some(OsStr::new("PNG")));
        assert_eq!(extension_key(Path::new("README")), None);
        assert_eq!(extension_key(Path::new(".bashrc")), None);
        assert_eq!(extension_key(Path::new("notes.")), None);
    }

    #[test]
    fn test_destination_for() {
        let layout = layout();
        assert_eq!(
            layout.destination_for(Path::new("picture/icons/mongodb.jpg")),
            Some(PathBuf::from("dist/jpg/mongodb.jpg"))
        );
        assert_eq!(
            layout.destination_for(Path::new("picture/README")),
            Some(PathBuf::from("dist/noext/README"))
        );
        assert_eq!(
            layout.destination_for(Path::new("picture/.hidden")),
            Some(PathBuf::from("dist/noext/.hidden"))
        );
    }

    #[test]
    fn test_destination_without_file_name() {
        assert_eq!(layout().destination_for(Path::new("..")), None);
    }

    proptest! {
        #[test]
        fn prop_file_lands_in_its_own_extension(
            stem in "[a-zA-Z0-9_-]{1,12}",
            ext in "[a-zA-Z0-9]{1,6}",
            dirs in proptest::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let mut source = PathBuf::from("src");
            for dir in &dirs {
                source.push(dir);
            }
            source.push(format!("{}.{}", stem, ext));

            let dest = layout().destination_for(&source).unwrap();
            prop_assert_eq!(dest, PathBuf::from("dist").join(&ext).join(format!("{}.{}", stem, ext)));
        }

        #[test]
        fn prop_dotless_names_use_no_ext_bucket(stem in "[a-zA-Z0-9_-]{1,12}") {
            let dest = layout().destination_for(Path::new(&stem)).unwrap();
            prop_assert_eq!(dest, PathBuf::from("dist/noext").join(&stem));
        }
    }
}
