pub mod dispatcher;
pub mod error;
pub mod key;
pub mod request;

pub use dispatcher::{HttpEmailDispatcher, JobReference, NotificationDispatcher};
pub use error::DispatchError;
pub use key::NotificationKey;
pub use request::{
    NotificationPeriod, NotificationRequest, NotificationTemplate, OrganizationContext,
    TemplateKind,
};
