use chrono::Local;
use indexmap::IndexMap;
use thiserror::Error;

use crate::filter::{FilterCriteria, FilterError, FilterInput};
use crate::types::{ActionState, BatchId, PollStatus, RowState, TestDescriptor, TestType};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One test plus its mutable dashboard state.
#[derive(Debug, Clone)]
pub struct TestRow {
    pub descriptor: TestDescriptor,
    pub checked: bool,
    /// Run state for this session. The catalogue status stays on the
    /// descriptor and is only displayed.
    pub state: RowState,
    /// Raw exception text reported for a failed run.
    pub exception: Option<String>,
    pub visible: bool,
    pub pinned: bool,
}

impl TestRow {
    fn new(descriptor: TestDescriptor) -> Self {
        Self {
            descriptor,
            checked: false,
            state: RowState::Idle,
            exception: None,
            visible: true,
            pinned: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.name
    }
}

// ---------------------------------------------------------------------------
// Run orchestration results
// ---------------------------------------------------------------------------

/// What the caller must do after asking to run the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDecision {
    /// A batch is still outstanding; ask the user before submitting another.
    NeedsConfirmation,
    /// Submit these test ids as `batch`.
    Submit { batch: BatchId, tests: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("You must select at least one test")]
    NoSelection,
    #[error("You need to run tests first!")]
    NoFinishedRun,
}

pub const STATUS_NO_TESTS: &str = "No tests to run...";
pub const STATUS_READY: &str = "Ready to run more tests!";
pub const STATUS_CONTINUE: &str = "Continue working on pending execution.";
pub const STATUS_RESUBMIT: &str = "Submiting a new request";
pub const NOTICE_NO_MATCH: &str = "There is no test matching your filter";

// ---------------------------------------------------------------------------
// Dashboard session
// ---------------------------------------------------------------------------

/// View-model for one dashboard session.
///
/// Owns every row, the per-type totals, the filter controls and the
/// running/finished flags. Visibility is always recomputed from the compiled
/// criteria and each row's own attributes.
#[derive(Debug, Clone)]
pub struct Dashboard {
    rows: Vec<TestRow>,
    /// Row indices moved to the top, front first.
    pinned: Vec<usize>,
    totals: IndexMap<TestType, usize>,
    filter: FilterInput,
    criteria: FilterCriteria,
    failed_only: bool,
    running: bool,
    finished: bool,
    active_batch: Option<BatchId>,
    next_batch: u64,
    status: String,
    notice: Option<String>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Dashboard {
    pub fn new(tests: Vec<TestDescriptor>) -> Self {
        let mut totals: IndexMap<TestType, usize> = IndexMap::new();
        let rows = tests
            .into_iter()
            .map(|t| {
                *totals.entry(t.test_type).or_insert(0) += 1;
                TestRow::new(t)
            })
            .collect();
        Self {
            rows,
            pinned: Vec::new(),
            totals,
            filter: FilterInput::default(),
            criteria: FilterCriteria::default(),
            failed_only: false,
            running: false,
            finished: false,
            active_batch: None,
            next_batch: 1,
            status: String::new(),
            notice: None,
        }
    }

    /// Replace the filter controls, e.g. with configured defaults.
    pub fn with_filter(mut self, filter: FilterInput) -> Self {
        self.filter = filter;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn rows(&self) -> &[TestRow] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&TestRow> {
        self.rows.get(idx)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-type counts in first-seen order.
    pub fn totals(&self) -> &IndexMap<TestType, usize> {
        &self.totals
    }

    /// `"unit: 3  integration: 1  Total: 4"`.
    pub fn stat_line(&self) -> String {
        let mut parts: Vec<String> = self
            .totals
            .iter()
            .map(|(t, n)| format!("{t}: {n}"))
            .collect();
        parts.push(format!("Total: {}", self.rows.len()));
        parts.join("  ")
    }

    pub fn filter(&self) -> &FilterInput {
        &self.filter
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn failed_only(&self) -> bool {
        self.failed_only
    }

    pub fn active_batch(&self) -> Option<BatchId> {
        self.active_batch
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("dashboard: notice: {message}");
        self.notice = Some(message);
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    /// Row indices in display order: pinned rows first, then the rest in load order.
    pub fn display_order(&self) -> Vec<usize> {
        let mut order = self.pinned.clone();
        order.extend((0..self.rows.len()).filter(|&i| !self.rows[i].pinned));
        order
    }

    /// Visible row indices in display order.
    pub fn visible_rows(&self) -> Vec<usize> {
        self.display_order()
            .into_iter()
            .filter(|&i| self.rows[i].visible)
            .collect()
    }

    pub fn pinned(&self) -> &[usize] {
        &self.pinned
    }

    // -----------------------------------------------------------------------
    // Filter controls
    // -----------------------------------------------------------------------

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    pub fn toggle_combinator(&mut self) {
        self.filter.combinator = self.filter.combinator.toggled();
    }

    pub fn toggle_case_sensitive(&mut self) {
        self.filter.case_sensitive = !self.filter.case_sensitive;
    }

    pub fn toggle_category(&mut self, test_type: TestType) {
        self.filter.toggle_category(test_type);
    }

    /// Compile the current controls and recompute every row's visibility.
    ///
    /// On an invalid pattern the previous visibility is kept and the error is
    /// raised as a notice. When nothing is visible a notice is raised too.
    ///
    /// Returns the number of visible rows.
    pub fn apply_filter(&mut self) -> Result<usize, FilterError> {
        let criteria = match self.filter.compile() {
            Ok(c) => c,
            Err(e) => {
                self.alert(e.to_string());
                return Err(e);
            }
        };
        self.criteria = criteria;
        let visible = self.refresh_visibility();
        if visible == 0 && !self.rows.is_empty() {
            self.alert(NOTICE_NO_MATCH);
        }
        Ok(visible)
    }

    /// Recompute visibility for all rows from the current criteria.
    fn refresh_visibility(&mut self) -> usize {
        let criteria = &self.criteria;
        let failed_only = self.failed_only;
        let mut visible = 0;
        for row in &mut self.rows {
            row.visible = criteria.is_visible(
                row.checked,
                row.descriptor.test_type,
                &row.descriptor.name,
            ) && (!failed_only || row.state == RowState::Failed);
            visible += usize::from(row.visible);
        }
        visible
    }

    /// Hide every row that did not fail in the last run, or undo that.
    ///
    /// Refused until a batch has finished.
    pub fn toggle_failed_only(&mut self) -> Result<bool, RunError> {
        if !self.finished {
            self.alert(RunError::NoFinishedRun.to_string());
            return Err(RunError::NoFinishedRun);
        }
        self.failed_only = !self.failed_only;
        self.refresh_visibility();
        Ok(self.failed_only)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn toggle_checked(&mut self, idx: usize) -> usize {
        if let Some(row) = self.rows.get_mut(idx) {
            row.checked = !row.checked;
        }
        self.selected_count()
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.checked).count()
    }

    /// `"3 Tests Selected"`, `"1 Test Selected"` or empty.
    pub fn selected_label(&self) -> String {
        match self.selected_count() {
            0 => String::new(),
            1 => "1 Test Selected".to_owned(),
            n => format!("{n} Tests Selected"),
        }
    }

    /// Check or uncheck every visible row. Hidden rows keep their state.
    pub fn select_all_visible(&mut self, checked: bool) -> usize {
        for row in self.rows.iter_mut().filter(|r| r.visible) {
            row.checked = checked;
        }
        self.selected_count()
    }

    /// Move checked rows that are not pinned yet to the front of the pinned
    /// list, keeping their display order. Returns how many rows moved.
    pub fn move_selected_to_top(&mut self) -> usize {
        let moving: Vec<usize> = self
            .display_order()
            .into_iter()
            .filter(|&i| self.rows[i].checked && !self.rows[i].pinned)
            .collect();
        for &i in &moving {
            self.rows[i].pinned = true;
        }
        let count = moving.len();
        let mut pinned = moving;
        pinned.append(&mut self.pinned);
        self.pinned = pinned;
        count
    }

    fn selected_ids(&self) -> Vec<(usize, String)> {
        self.display_order()
            .into_iter()
            .filter(|&i| self.rows[i].checked)
            .map(|i| (i, self.rows[i].id().to_owned()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Run orchestration
    // -----------------------------------------------------------------------

    /// Prepare a batch from the checked rows.
    ///
    /// While a batch is outstanding this asks for confirmation first unless
    /// `confirmed` is set. With nothing checked no batch is created.
    pub fn run(&mut self, confirmed: bool) -> Result<RunDecision, RunError> {
        if self.running {
            if !confirmed {
                return Ok(RunDecision::NeedsConfirmation);
            }
            self.status = STATUS_RESUBMIT.to_owned();
        }

        let selected = self.selected_ids();
        if selected.is_empty() {
            self.status = STATUS_NO_TESTS.to_owned();
            self.alert(RunError::NoSelection.to_string());
            return Err(RunError::NoSelection);
        }

        for &(i, _) in &selected {
            let row = &mut self.rows[i];
            row.state = RowState::Enqueued;
            row.exception = None;
        }
        if self.failed_only {
            self.refresh_visibility();
        }

        let batch = BatchId(self.next_batch);
        self.next_batch += 1;
        self.active_batch = Some(batch);
        self.running = true;
        self.status = format!("Enqueueing {} tests...", selected.len());
        tracing::info!("dashboard: batch {batch} with {} tests", selected.len());

        Ok(RunDecision::Submit {
            batch,
            tests: selected.into_iter().map(|(_, id)| id).collect(),
        })
    }

    /// The user declined to submit while a batch is outstanding.
    pub fn decline_run(&mut self) {
        self.status = STATUS_CONTINUE.to_owned();
    }

    fn is_active(&self, batch: BatchId) -> bool {
        self.active_batch == Some(batch)
    }

    /// Submission of `batch` failed. Returns `false` for a batch no longer tracked.
    pub fn batch_rejected(&mut self, batch: BatchId, state: ActionState) -> bool {
        if !self.is_active(batch) {
            return false;
        }
        self.alert(format!(
            "testRunner Action un-successful (return state = {state}), please check the server"
        ));
        self.reset_pending();
        self.end_batch();
        true
    }

    /// Apply one poll response to every enqueued or running row.
    pub fn apply_status(&mut self, batch: BatchId, status: &PollStatus) -> bool {
        if !self.is_active(batch) {
            return false;
        }
        for row in self.rows.iter_mut().filter(|r| r.state.is_pending()) {
            let Some(update) = status.tests_with_props_map.get(&row.descriptor.name) else {
                continue;
            };
            row.state = RowState::from_status(&update.status);
            row.exception = if row.state == RowState::Failed {
                update.exception.clone()
            } else {
                None
            };
        }
        if self.failed_only {
            self.refresh_visibility();
        }
        self.status = format!(
            "Tests Running | Last update: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        true
    }

    /// The server reported `batch` complete.
    ///
    /// Returns `true` only on the transition, so a repeated completion for the
    /// same batch is ignored.
    pub fn finish_batch(&mut self, batch: BatchId, status: &PollStatus) -> bool {
        if !self.apply_status(batch, status) {
            return false;
        }
        // Rows the final report left out can no longer change.
        self.reset_pending();
        if self.failed_only {
            self.refresh_visibility();
        }
        self.status = STATUS_READY.to_owned();
        self.end_batch();
        true
    }

    /// A poll for `batch` failed; the chain is over without success.
    pub fn poll_failed(&mut self, batch: BatchId, state: ActionState) -> bool {
        if !self.is_active(batch) {
            return false;
        }
        self.alert(format!(
            "poll Action un-successful (return state = {state}), please check the server"
        ));
        self.reset_pending();
        self.end_batch();
        true
    }

    /// Stop tracking the active batch locally.
    pub fn cancel_batch(&mut self) -> Option<BatchId> {
        let batch = self.active_batch?;
        self.reset_pending();
        self.running = false;
        self.active_batch = None;
        self.status = format!("Stopped polling batch {batch}");
        Some(batch)
    }

    fn reset_pending(&mut self) {
        for row in self.rows.iter_mut().filter(|r| r.state.is_pending()) {
            row.state = RowState::Idle;
        }
    }

    fn end_batch(&mut self) {
        self.running = false;
        self.finished = true;
        self.active_batch = None;
    }
}
