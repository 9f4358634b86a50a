use crate::application::declarations::SaveDeclarationUseCase;
use crate::application::link::{LinkError, LinkGenerator, SigningLink};
use crate::application::router::{RecordLookup, Route, RouteDecision, SessionRouter};
use crate::application::session::{
    CaptureOutcome, OpenOutcome, PendingCapture, SessionError, SessionKey, SessionState,
    SignatureSession,
};
use crate::application::surface::{DrawingSurface, SurfaceError};
use crate::domain::{
    CarrierData, Declaration, Equipment, RecipientData, SenderData, SignerRole, DEFAULT_CITY,
    FIRST_NUMBER_BASE,
};
use crate::infrastructure::api_client::{self, ClientError, HttpClient};
use crate::infrastructure::database::DeclarationRepository;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Signature is empty")]
    EmptyCapture,

    #[error("Declaration {0} is not loaded")]
    RecordMissing(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Surface(SurfaceError),
}

impl From<SurfaceError> for SaveError {
    fn from(e: SurfaceError) -> Self {
        match e {
            SurfaceError::Empty => SaveError::EmptyCapture,
            other => SaveError::Surface(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("No declaration is selected")]
    NoActiveRecord,

    #[error("Declaration {0} is not loaded")]
    RecordMissing(String),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Edit,
    Preview,
    Consultation,
    SignatureMode,
}

/// What the operator sees after requesting a signature
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    pub key: SessionKey,
    pub link: SigningLink,
    pub qr_svg: String,
}

/// A capture on its way to the persistence gateway
#[derive(Debug, Clone)]
pub struct PendingSave {
    capture: PendingCapture,
    record: Declaration,
}

impl PendingSave {
    /// Full record to hand to the gateway
    pub fn record(&self) -> &Declaration {
        &self.record
    }

    pub fn key(&self) -> &SessionKey {
        self.capture.key()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(SessionKey),
    /// The gateway refused; the drawing is kept for a retry
    Failed { key: SessionKey, message: String },
    Discarded(SessionKey),
}

/// Client-side state of the declaration app
///
/// Single owner of the loaded records, the current view and the signing
/// workflow. Every transition goes through a method here.
pub struct Workspace {
    records: Vec<Declaration>,
    active: Option<String>,
    view: View,
    session: SignatureSession,
    surface: DrawingSurface,
    router: SessionRouter,
    links: LinkGenerator,
    username: String,
}

impl Workspace {
    pub fn new(links: LinkGenerator, surface: DrawingSurface, username: &str) -> Self {
        Self {
            records: Vec::new(),
            active: None,
            view: View::Edit,
            session: SignatureSession::new(),
            surface,
            router: SessionRouter::new(),
            links,
            username: username.to_string(),
        }
    }

    pub fn records(&self) -> &[Declaration] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Declaration> {
        self.records.lookup(id)
    }

    pub fn active_record(&self) -> Option<&Declaration> {
        self.active.as_deref().and_then(|id| self.record(id))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> &SignatureSession {
        &self.session
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    pub fn location(&self) -> &str {
        self.router.location()
    }

    /// Signing link that names a record this device has not loaded
    pub fn pending_link(&self) -> Option<SessionKey> {
        match self.router.resolve(&self.records) {
            RouteDecision::Unresolved(key) => Some(key),
            _ => None,
        }
    }

    pub fn load_records(&mut self, records: Vec<Declaration>) {
        debug!("Loaded {} declarations", records.len());
        self.records = records;
        if let Some(id) = &self.active {
            if self.records.lookup(id).is_none() {
                self.active = None;
            }
        }
        self.apply_route();
    }

    pub fn upsert_record(&mut self, record: Declaration) {
        match self.records.iter_mut().find(|d| d.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
        self.apply_route();
    }

    pub fn remove_record(&mut self, id: &str) {
        self.records.retain(|d| d.id != id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
            self.view = View::Edit;
        }
    }

    pub fn select_record(&mut self, id: &str) -> Result<(), WorkspaceError> {
        if self.record(id).is_none() {
            return Err(WorkspaceError::RecordMissing(id.to_string()));
        }
        self.active = Some(id.to_string());
        self.view = View::Preview;
        Ok(())
    }

    pub fn show(&mut self, view: View) {
        self.view = view;
        if view == View::Edit {
            self.active = None;
        }
    }

    /// Number the next generated declaration gets
    ///
    /// Continues from the highest loaded number, or from the fixed base when
    /// nothing numbered is loaded.
    pub fn next_number(&self) -> u64 {
        let last = self
            .records
            .iter()
            .filter_map(Declaration::parsed_number)
            .max()
            .filter(|n| *n > 0)
            .unwrap_or(FIRST_NUMBER_BASE);
        last.saturating_add(1)
    }

    /// Build an unsaved declaration carrying the next number
    pub fn generate_declaration(
        &self,
        recipient: RecipientData,
        equipment: Vec<Equipment>,
        sender: SenderData,
        carrier: CarrierData,
    ) -> Declaration {
        Declaration::new(self.next_number(), DEFAULT_CITY, recipient, equipment, sender, carrier)
    }

    /// Declarations whose number contains `term`, or whose sender name or
    /// carrier company contains it ignoring case
    pub fn search(&self, term: &str) -> Vec<&Declaration> {
        let needle = term.to_lowercase();
        self.records
            .iter()
            .filter(|d| {
                d.number.contains(term)
                    || d.sender.name.to_lowercase().contains(&needle)
                    || d.carrier.company_name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Route change notification
    pub fn navigate(&mut self, location: &str) -> Route {
        let route = self.router.navigate(location);
        self.apply_route();
        route
    }

    /// Operator asks for a signature on the active record
    ///
    /// Opens the session for local capture and returns the link to share
    /// with a second device. Re-signing a role that already has an image
    /// goes through here.
    pub fn request_signature(&mut self, role: SignerRole) -> Result<SignatureRequest, WorkspaceError> {
        let record = self.active_record().ok_or(WorkspaceError::NoActiveRecord)?;
        let key = SessionKey::new(record.id.clone(), role);

        let link = self.links.link_for(&key)?;
        let qr_svg = link.qr_svg()?;

        if self.session.open(key.clone()) == OpenOutcome::Opened {
            self.reset_surface();
        }
        Ok(SignatureRequest { key, link, qr_svg })
    }

    pub fn begin_save(&mut self) -> Result<PendingSave, SaveError> {
        let key = match (self.session.state(), self.session.key()) {
            (SessionState::AwaitingCapture, Some(key)) => key.clone(),
            _ => return Err(SessionError::NotAwaitingCapture.into()),
        };
        if self.session.is_saving() {
            return Err(SessionError::SaveInProgress.into());
        }

        let image = self.surface.export()?;
        let mut record = self
            .record(&key.record_id)
            .cloned()
            .ok_or_else(|| SaveError::RecordMissing(key.record_id.clone()))?;
        record.set_signature(key.role, Some(image.clone()));

        let capture = self.session.begin_save(image)?;
        self.surface.lock();
        Ok(PendingSave { capture, record })
    }

    pub fn finish_save(&mut self, pending: PendingSave, result: Result<(), String>) -> SaveOutcome {
        match self.session.complete(pending.capture, result) {
            CaptureOutcome::Completed { key, image } => {
                // Apply only this role so a newer copy of the other role survives
                match self.records.iter_mut().find(|d| d.id == key.record_id) {
                    Some(record) => record.set_signature(key.role, Some(image)),
                    None => self.records.insert(0, pending.record),
                }
                self.reset_surface();
                self.active = Some(key.record_id.clone());
                self.leave_sign_route(&key);
                SaveOutcome::Saved(key)
            }
            CaptureOutcome::Failed { key, message } => {
                self.surface.unlock();
                SaveOutcome::Failed { key, message }
            }
            CaptureOutcome::Discarded { key } => SaveOutcome::Discarded(key),
        }
    }

    /// Save through an in-process repository
    pub fn save_to(&mut self, repository: &dyn DeclarationRepository) -> Result<SaveOutcome, SaveError> {
        let pending = self.begin_save()?;
        let result = SaveDeclarationUseCase::new(repository)
            .execute(pending.record(), &self.username)
            .map(|_| ())
            .map_err(|e| e.to_string());
        Ok(self.finish_save(pending, result))
    }

    /// Save through the REST API
    pub async fn save_over_http(
        &mut self,
        client: &HttpClient,
        api_url: &str,
    ) -> Result<SaveOutcome, SaveError> {
        let pending = self.begin_save()?;
        let result = api_client::save_declaration(client, api_url, pending.record(), &self.username)
            .await
            .map_err(|e| e.to_string());
        Ok(self.finish_save(pending, result))
    }

    pub fn cancel(&mut self) -> Result<SessionKey, SessionError> {
        let key = self.session.cancel()?;
        self.reset_surface();
        self.leave_sign_route(&key);
        Ok(key)
    }

    /// Fetch the record a pending signing link names, then re-run routing
    ///
    /// Returns true when the record was found.
    pub async fn resolve_remote(&mut self, client: &HttpClient, api_url: &str) -> Result<bool, WorkspaceError> {
        let Some(key) = self.pending_link() else {
            return Ok(false);
        };
        match api_client::fetch_declaration(client, api_url, &key.record_id).await? {
            Some(record) => {
                info!("Fetched declaration {} for signing link", record.id);
                self.upsert_record(record);
                Ok(true)
            }
            None => {
                warn!("Signing link names unknown declaration {}", key.record_id);
                Ok(false)
            }
        }
    }

    /// Re-fetch the full record list
    pub async fn refresh(&mut self, client: &HttpClient, api_url: &str) -> Result<(), WorkspaceError> {
        let records = api_client::fetch_declarations(client, api_url).await?;
        self.load_records(records);
        Ok(())
    }

    // The closed session's link must not match again on the next record reload
    fn leave_sign_route(&mut self, key: &SessionKey) {
        if matches!(self.router.current(), Route::SignRequest(ref routed) if routed == key) {
            self.router.clear();
        }
        if self.view == View::SignatureMode {
            self.view = View::Preview;
        }
    }

    fn reset_surface(&mut self) {
        self.surface.end();
        self.surface.clear();
        self.surface.unlock();
    }

    fn apply_route(&mut self) {
        match self.router.resolve(&self.records) {
            RouteDecision::Idle => {}
            RouteDecision::Unresolved(key) => {
                debug!("Signing link {} waits for its declaration", key);
            }
            RouteDecision::Open(key) | RouteDecision::AlreadySigned(key)
                if self.session.is_awaiting(&key) =>
            {
                self.active = Some(key.record_id);
                self.view = View::SignatureMode;
            }
            RouteDecision::AlreadySigned(key) => {
                info!("Signing link {} already captured, showing preview", key);
                self.active = Some(key.record_id);
                self.view = View::Preview;
            }
            RouteDecision::Open(key) => {
                self.active = Some(key.record_id.clone());
                self.view = View::SignatureMode;
                if self.session.open(key) == OpenOutcome::Opened {
                    self.reset_surface();
                }
            }
        }
    }
}
