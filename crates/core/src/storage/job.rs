//! Job folder naming.

use uuid::Uuid;

/// Key prefix shared by every job folder.
const JOBS_PREFIX: &str = "jobs";

/// The storage prefix grouping one request's artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobFolder {
    id: Uuid,
}

impl JobFolder {
    /// Allocate a fresh job folder.
    #[must_use]
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Address an existing job folder.
    #[must_use]
    pub const fn from_id(id: Uuid) -> Self {
        Self { id }
    }

    /// The job identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Folder prefix, with trailing slash.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{JOBS_PREFIX}/{}/", self.id)
    }

    /// Key of the uploaded sketch.
    #[must_use]
    pub fn sketch_key(&self, extension: &str) -> String {
        format!("{}sketch.{extension}", self.prefix())
    }

    /// Key of the effective video prompt.
    #[must_use]
    pub fn prompt_key(&self) -> String {
        format!("{}prompt.txt", self.prefix())
    }

    /// Key of the generated still image.
    #[must_use]
    pub fn generated_image_key(&self, extension: &str) -> String {
        format!("{}generated-image.{extension}", self.prefix())
    }

    /// Prefix the video provider writes its output under, with trailing slash.
    #[must_use]
    pub fn video_prefix(&self) -> String {
        format!("{}videos/", self.prefix())
    }
}

impl Default for JobFolder {
    fn default() -> Self {
        Self::new()
    }
}
