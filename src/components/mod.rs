pub mod kb_card;
pub mod share_modal;
pub mod tooltip;

pub use kb_card::KnowledgeBaseCard;
pub use share_modal::SharePermissionModal;
pub use tooltip::Tooltip;
