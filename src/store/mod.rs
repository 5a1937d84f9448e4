//! External collaborators of the pipeline: the product catalog, the owned
//! cart repository, the notification fan-out, and the navigation sink.
//! The core treats all of these as replaceable CRUD/event surfaces.

pub mod cart;
pub mod catalog;
pub mod nav;
pub mod notify;

pub use cart::{CartItem, CartStore};
pub use catalog::{Product, ProductCatalog};
pub use nav::{NavigationRequest, NavigationSink, RouteNavigator, RouteState};
pub use notify::{
    Notification, NotificationAction, NotificationEffect, NotificationHub, NotificationKind,
};
