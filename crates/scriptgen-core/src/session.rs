use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::batch::BatchRun;
use crate::diagnostic::{
    parser::parse_report,
    ranking::{rank, Selection},
    Candidate,
};
use crate::error::{InputError, Result, ValidationError};
use crate::store::{Library, RecordStore, SavedConfig};
use crate::templates::{documentation, generate, GeneratedScriptSet, ScriptCategory};

/// Where a session is in the analyze, select, generate flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Diagnostic,
    Candidates,
    Scripts,
}

/// Scripts and their write-up for the selected candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedOutput {
    pub candidate: Candidate,
    pub scripts: GeneratedScriptSet,
    pub documentation: String,
}

/// State for working on one category at a time.
#[derive(Debug)]
pub struct GenerationSession {
    category: ScriptCategory,
    step: Step,
    candidates: Vec<Candidate>,
    selection: Selection,
    output: Option<GeneratedOutput>,
    batch: Option<BatchRun>,
}

impl GenerationSession {
    pub fn new(category: ScriptCategory) -> Self {
        Self {
            category,
            step: Step::Diagnostic,
            candidates: Vec::new(),
            selection: Selection::Unselected,
            output: None,
            batch: None,
        }
    }

    /// Start a session and count it as one use of `category`.
    pub fn open<S: RecordStore>(category: ScriptCategory, library: &Library<S>) -> Result<Self> {
        library.record_use(category)?;
        Ok(Self::new(category))
    }

    pub fn category(&self) -> ScriptCategory {
        self.category
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Ranked candidates from the last analysis.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn output(&self) -> Option<&GeneratedOutput> {
        self.output.as_ref()
    }

    /// Parse and rank `raw`, then auto-select the top candidate when it is
    /// confident enough. Blank input is rejected and leaves the session as is.
    #[instrument(name = "analyze", skip(self, raw), fields(category = %self.category))]
    pub fn analyze(&mut self, raw: &str, threshold: u8) -> Result<&[Candidate]> {
        if raw.trim().is_empty() {
            return Err(InputError::EmptyDiagnostic.into());
        }
        self.candidates = rank(parse_report(raw));
        self.selection = Selection::Unselected;
        self.output = None;
        let auto = self.selection.auto_select(&self.candidates, threshold);
        self.step = Step::Candidates;
        info!(
            candidates = self.candidates.len(),
            auto_selected = auto,
            "report analyzed"
        );
        Ok(&self.candidates)
    }

    pub fn select(&mut self, index: i64) -> Result<&Candidate> {
        let i = self.selection.select(index, self.candidates.len())?;
        Ok(&self.candidates[i])
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selection.index().and_then(|i| self.candidates.get(i))
    }

    /// Generate scripts for the selected candidate.
    pub fn generate(&mut self) -> Result<&GeneratedOutput> {
        let candidate = self
            .selected()
            .cloned()
            .ok_or(ValidationError::NoSelection)?;
        let scripts = generate(
            self.category,
            &candidate.selector,
            i64::from(candidate.confidence()),
        );
        let documentation = documentation(
            self.category,
            &candidate.selector,
            candidate.score,
            &scripts,
        );
        self.step = Step::Scripts;
        Ok(&*self.output.insert(GeneratedOutput {
            candidate,
            scripts,
            documentation,
        }))
    }

    /// Save the last generated output. Without a name the config is called
    /// `<category>-<unix millis>`.
    pub fn save_to_library<S: RecordStore>(
        &self,
        library: &Library<S>,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SavedConfig> {
        let output = self.output.as_ref().ok_or(ValidationError::NoSelection)?;
        let name = match name {
            Some(name) if name.trim().is_empty() => return Err(InputError::EmptyConfigName.into()),
            Some(name) => name.trim().to_string(),
            None => format!("{}-{}", self.category, now.timestamp_millis()),
        };
        let config = SavedConfig {
            name,
            category: self.category,
            selector: output.candidate.selector.clone(),
            score: output.candidate.score,
            scripts: output.scripts.clone(),
            documentation: output.documentation.clone(),
            created: now,
        };
        library.save_config(config.clone())?;
        Ok(config)
    }

    pub fn start_batch(&mut self) -> &mut BatchRun {
        if let Some(previous) = self.batch.take() {
            previous.cancel();
        }
        self.batch.insert(BatchRun::start())
    }

    pub fn batch(&self) -> Option<&BatchRun> {
        self.batch.as_ref()
    }

    pub fn batch_mut(&mut self) -> Option<&mut BatchRun> {
        self.batch.as_mut()
    }

    /// End the session, cancelling any batch still running.
    pub fn close(mut self) {
        if let Some(batch) = self.batch.take() {
            batch.cancel();
        }
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if let Some(batch) = &self.batch {
            batch.cancel();
        }
    }
}
