pub mod callback_data;
pub mod request_id;
pub mod text;
