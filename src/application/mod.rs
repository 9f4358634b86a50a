mod declarations;
pub mod link;
pub mod router;
pub mod session;
pub mod surface;
mod types;
mod workspace;

pub use declarations::{
    audit_entries, DeclarationError, DeleteDeclarationUseCase, SaveDeclarationUseCase,
};
pub use link::{LinkError, LinkGenerator, SigningLink};
pub use router::{parse_route, RecordLookup, Route, RouteDecision, SessionRouter};
pub use session::{
    CaptureOutcome, OpenOutcome, PendingCapture, SessionError, SessionKey, SessionState,
    SignatureSession,
};
pub use surface::{
    Bounds, DrawingSurface, InputResponse, PenStyle, Point, PointerInput, PointerPhase,
    SurfaceError,
};
pub use types::{SigningLinkResponse, SuccessResponse};
pub use workspace::{
    PendingSave, SaveError, SaveOutcome, SignatureRequest, View, Workspace, WorkspaceError,
};
