// Session state for one run of the front-end: which image is picked, which
// model is chosen and what the last detection produced.
//
// Result, error and loading live in a single `Outcome`, so the panel can
// never show a result and an error at once. Every submit gets a fresh
// `RequestToken`; only the newest token is allowed to settle the session.

use crate::error::{ApiError, MISSING_IMAGE};
use crate::model::{ModelName, Prediction};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Anything that can turn an image and a model into a prediction. The HTTP
/// client is the real one; tests plug in fakes.
pub trait Predictor {
    fn predict(&self, image: &Path, model: ModelName) -> Result<Prediction, ApiError>;
}

/// What the UI shows for a picked file.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// `file://` URL of the image, usable by terminals and viewers that
    /// understand links.
    pub url: Url,
    pub file_name: String,
    pub size_bytes: u64,
}

impl Preview {
    pub fn for_path(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        let absolute = fs::canonicalize(path)?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot build a file URL for {}", absolute.display()),
            )
        })?;
        let file_name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Preview {
            url,
            file_name,
            size_bytes: meta.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub path: PathBuf,
    pub preview: Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    #[default]
    Idle,
    Loading(RequestToken),
    Success(Prediction),
    Failure(String),
}

/// Everything needed to run one detection outside the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub token: RequestToken,
    pub image: PathBuf,
    pub model: ModelName,
}

#[derive(Debug, Default)]
pub struct Session {
    selected: Option<SelectedImage>,
    model: ModelName,
    outcome: Outcome,
    issued: u64,
    /// Token allowed to settle; `None` once settled or superseded.
    current: Option<RequestToken>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: ModelName) -> Self {
        Session {
            model,
            ..Self::default()
        }
    }

    /// Pick a new image. Any file is accepted as long as it can be read.
    /// Clears result and error and drops whatever was in flight.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> io::Result<&SelectedImage> {
        let path = path.as_ref();
        let preview = Preview::for_path(path)?;
        log::debug!("selected {} ({} bytes)", preview.url, preview.size_bytes);
        self.supersede();
        self.outcome = Outcome::Idle;
        let selected = self.selected.insert(SelectedImage {
            path: path.to_path_buf(),
            preview,
        });
        Ok(&*selected)
    }

    /// Choose another model. A previous result no longer matches the choice
    /// and is cleared; an error message stays where it is.
    pub fn select_model(&mut self, model: ModelName) {
        self.model = model;
        match self.outcome {
            Outcome::Success(_) => self.outcome = Outcome::Idle,
            Outcome::Loading(_) => {
                self.supersede();
                self.outcome = Outcome::Idle;
            }
            Outcome::Idle | Outcome::Failure(_) => {}
        }
    }

    /// Start a detection. Without an image this records the validation
    /// message and returns `None`.
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        let Some(selected) = &self.selected else {
            self.outcome = Outcome::Failure(MISSING_IMAGE.to_string());
            return None;
        };
        self.issued += 1;
        let token = RequestToken(self.issued);
        let pending = PendingRequest {
            token,
            image: selected.path.clone(),
            model: self.model,
        };
        self.current = Some(token);
        self.outcome = Outcome::Loading(token);
        Some(pending)
    }

    /// Apply the answer for `token`. Returns `false`, and changes nothing,
    /// when a newer submit or a new selection has superseded it.
    pub fn settle(&mut self, token: RequestToken, result: Result<Prediction, ApiError>) -> bool {
        if self.current != Some(token) {
            log::debug!("discarding stale response for request {:?}", token);
            return false;
        }
        self.current = None;
        self.outcome = match result {
            Ok(prediction) => Outcome::Success(prediction),
            Err(e) => Outcome::Failure(e.user_message()),
        };
        true
    }

    /// Run one detection end to end against `predictor`.
    pub fn submit(&mut self, predictor: &dyn Predictor) -> &Outcome {
        if let Some(pending) = self.begin_submit() {
            let result = predictor.predict(&pending.image, pending.model);
            self.settle(pending.token, result);
        }
        &self.outcome
    }

    fn supersede(&mut self) {
        if let Some(token) = self.current.take() {
            log::debug!("request {:?} superseded", token);
        }
    }

    pub fn model(&self) -> ModelName {
        self.model
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.outcome, Outcome::Loading(_))
    }

    pub fn result(&self) -> Option<&Prediction> {
        match &self.outcome {
            Outcome::Success(p) => Some(p),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure(msg) => Some(msg),
            _ => None,
        }
    }
}
