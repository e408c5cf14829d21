pub mod audit_logs;
pub mod menus;
pub mod orders;
pub mod restaurant_menus;
pub mod restaurants;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use menus::Entity as Menus;
pub use orders::Entity as Orders;
pub use restaurant_menus::Entity as RestaurantMenus;
pub use restaurants::Entity as Restaurants;
pub use users::Entity as Users;
