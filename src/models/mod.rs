mod blog;
mod events;

pub use blog::{BlogPost, CallToAction, CtaKind, NewPost, PostPayload, UpdatePostRequest};
pub use events::{
    BlogEventRequest, BlogInteractionEvent, EventType, NewBlogEvent, NewVisitor,
    UnknownEventType, VisitRequest, VisitorEvent,
};
