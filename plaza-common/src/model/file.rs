use crate::model::Id;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FileMarker;

/// A file stored in the image bucket together with the URLs derived from it.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct StoredImage {
    pub file_id: Id<FileMarker>,
    pub preview_url: String,
    pub download_url: String,
}
