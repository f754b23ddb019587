//! Domain types and models

pub mod consent;
pub mod popup;

pub use consent::{
    ConfirmConsentCodeRequest, ConsentLink, ConsentLinkParameter, ConsentLinkRequest,
    ConsentLinkResponse,
};
pub use popup::{LoginResult, OAuthPopupOptions, PopupFeatures, PopupId, ScreenSize, WindowMessage};
