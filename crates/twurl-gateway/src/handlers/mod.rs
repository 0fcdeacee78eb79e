mod health;
mod owner;
mod redirect;
mod url;

pub use health::health_handler;
pub use owner::{delete_owner_urls_handler, list_owner_urls_handler};
pub use redirect::redirect_handler;
pub use url::{create_url_handler, delete_url_handler, edit_note_handler, get_url_handler};
