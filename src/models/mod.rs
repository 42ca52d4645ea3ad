pub mod qrcode;

pub use qrcode::{NewQrCode, QrCode, Scan};
