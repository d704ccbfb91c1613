//! Paginated walk over a function's published versions.
//!
//! The "most recent" version is the last entry of the last page. That relies
//! on the service listing versions in ascending order; if it does not, the
//! result is simply the last entry of whichever page came back last.

use crate::error::ServiceResult;
use crate::service::{FunctionService, VersionPage};

/// Lazy sequence of version pages, following continuation markers.
pub struct VersionPages<'a, S: FunctionService + ?Sized> {
    service: &'a S,
    function: &'a str,
    marker: Option<String>,
    done: bool,
}

impl<'a, S: FunctionService + ?Sized> VersionPages<'a, S> {
    pub fn new(service: &'a S, function: &'a str) -> Self {
        Self {
            service,
            function,
            marker: None,
            done: false,
        }
    }

    /// Restart a walk from a continuation marker returned by an earlier page.
    pub fn resume_from(service: &'a S, function: &'a str, marker: impl Into<String>) -> Self {
        Self {
            service,
            function,
            marker: Some(marker.into()),
            done: false,
        }
    }
}

impl<S: FunctionService + ?Sized> Iterator for VersionPages<'_, S> {
    type Item = ServiceResult<VersionPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self
            .service
            .list_versions(self.function, self.marker.as_deref())
        {
            Ok(page) => {
                self.marker = page.next_marker.clone().filter(|m| !m.is_empty());
                self.done = self.marker.is_none();
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fold a page sequence down to the most recent version.
///
/// An empty final page falls back to the last entry of the latest non-empty
/// page. Returns `Ok(None)` when no page listed any version.
pub fn latest_version<I>(pages: I) -> ServiceResult<Option<String>>
where
    I: IntoIterator<Item = ServiceResult<VersionPage>>,
{
    pages
        .into_iter()
        .try_fold(None, |latest, page| -> ServiceResult<Option<String>> {
            let page = page?;
            Ok(page.versions.last().cloned().or(latest))
        })
}
