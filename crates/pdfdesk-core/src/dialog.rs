//! Tool dialog state
//!
//! A `ToolDialog` is owned by one open dialog and performs no I/O. The caller
//! takes the request from `submit`, sends it however it likes (browser
//! `fetch`, reqwest) and hands the outcome to `settle`. Only one request can
//! be in flight per dialog; nothing is retried.

use crate::error::DialogError;
use crate::notice::{Notice, NoticeQueue};
use crate::protocol::ProcessResponse;
use crate::selection::{FileSelection, SelectedFile};
use crate::tools::{card_for, Endpoint, ToolCard};
use tracing::{debug, warn};

/// Everything needed to call a processing function
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub endpoint: Endpoint,
    /// Multipart field name for the files
    pub field: &'static str,
    pub files: Vec<SelectedFile>,
    /// Extra text fields
    pub fields: Vec<(String, String)>,
}

impl ProcessRequest {
    pub fn path(&self) -> String {
        format!("/functions/v1/{}", self.endpoint)
    }
}

pub struct ToolDialog {
    endpoint: Endpoint,
    selection: FileSelection,
    ranges: Option<String>,
    in_flight: bool,
    result: Option<ProcessResponse>,
    notices: NoticeQueue,
}

impl ToolDialog {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            selection: FileSelection::new(endpoint.accepted_files(), endpoint.multiple_files()),
            ranges: None,
            in_flight: false,
            result: None,
            notices: NoticeQueue::default(),
        }
    }

    /// Open a dialog for a catalog card; display-only cards have none
    pub fn for_card(card: &ToolCard) -> Result<Self, DialogError> {
        card.endpoint
            .map(Self::new)
            .ok_or_else(|| DialogError::DisplayOnly(card.title.to_string()))
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn card(&self) -> Option<&'static ToolCard> {
        card_for(self.endpoint)
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    /// For drag state changes
    pub fn selection_mut(&mut self) -> &mut FileSelection {
        &mut self.selection
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn result(&self) -> Option<&ProcessResponse> {
        self.result.as_ref()
    }

    pub fn download_url(&self) -> Option<&str> {
        self.result.as_ref()?.download_url.as_deref()
    }

    /// Page ranges for split, e.g. "1-3, 5". Ignored by other tools.
    pub fn set_ranges(&mut self, ranges: Option<String>) {
        self.ranges = ranges.filter(|r| !r.trim().is_empty());
    }

    /// Offer picked files; a rejected offer leaves the selection unchanged
    pub fn offer_files(&mut self, files: Vec<SelectedFile>) -> Result<usize, DialogError> {
        let result = self.selection.offer(files);
        self.check_offer(result)
    }

    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> Result<usize, DialogError> {
        let result = self.selection.drop_files(files);
        self.check_offer(result)
    }

    fn check_offer(
        &mut self,
        result: Result<usize, crate::error::SelectionError>,
    ) -> Result<usize, DialogError> {
        result.map_err(|err| {
            debug!(error = %err, "file offer rejected");
            self.notices.push(Notice::destructive(
                "Invalid File",
                format!("Please select valid {} files.", self.selection.accept()),
            ));
            DialogError::from(err)
        })
    }

    pub fn remove_file(&mut self, index: usize) -> Option<SelectedFile> {
        self.selection.remove(index)
    }

    /// Start a request. Fails while one is in flight or when the selection
    /// is empty or too small; nothing is sent in those cases.
    pub fn submit(&mut self) -> Result<ProcessRequest, DialogError> {
        if self.in_flight {
            return Err(DialogError::InFlight);
        }

        let count = self.selection.len();
        if count == 0 {
            self.notices.push(Notice::destructive(
                "No Files Selected",
                "Please select a file to process.",
            ));
            return Err(DialogError::NoFiles);
        }
        let required = self.endpoint.min_files();
        if count < required {
            self.notices.push(Notice::destructive(
                "More Files Needed",
                format!("Please select at least {} files.", required),
            ));
            return Err(DialogError::TooFewFiles {
                required,
                got: count,
            });
        }

        let mut fields = Vec::new();
        if let (Endpoint::SplitPdf, Some(ranges)) = (self.endpoint, &self.ranges) {
            fields.push(("ranges".to_string(), ranges.clone()));
        }

        self.result = None;
        self.in_flight = true;
        debug!(endpoint = %self.endpoint, files = count, "submitting");

        Ok(ProcessRequest {
            endpoint: self.endpoint,
            field: self.endpoint.form_field(),
            files: self.selection.files().to_vec(),
            fields,
        })
    }

    /// Finish the in-flight request. The in-flight flag is cleared whatever
    /// the outcome.
    pub fn settle(&mut self, outcome: Result<ProcessResponse, DialogError>) -> Option<&ProcessResponse> {
        self.in_flight = false;

        let outcome = outcome.and_then(|response| {
            if response.success {
                Ok(response)
            } else {
                Err(DialogError::Rejected(
                    response
                        .error
                        .unwrap_or_else(|| "Processing failed".to_string()),
                ))
            }
        });

        match outcome {
            Ok(response) => {
                let message = self.success_message(&response);
                self.notices
                    .push(Notice::info("Processing Complete", message));
                self.result = Some(response);
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "processing failed");
                self.result = None;
                self.notices
                    .push(Notice::destructive("Processing Failed", err.to_string()));
            }
        }
        self.result.as_ref()
    }

    fn success_message(&self, response: &ProcessResponse) -> String {
        match self.endpoint {
            Endpoint::CompressPdf => match &response.compression_ratio {
                Some(ratio) => format!("File size reduced by {}", ratio),
                None => "Your PDF has been compressed".to_string(),
            },
            Endpoint::SplitPdf => {
                let parts = response.split_files.as_ref().map_or(0, Vec::len);
                format!("Created {} files", parts)
            }
            Endpoint::MergePdf => format!(
                "Merged {} files",
                response.files_merged.unwrap_or(self.selection.len() as u32)
            ),
            Endpoint::ImageToPdf => format!(
                "Converted {} images to PDF",
                response
                    .images_processed
                    .unwrap_or(self.selection.len() as u32)
            ),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}
