macro_rules! malformed {
    ($file:expr, $format:expr, $offset:expr, $s:expr) => {
        $crate::types::Error::MalformedImage {
            file_name: $file.name.clone(),
            format: $format,
            offset: $offset,
            reason: $s.into(),
        }
    };
    ($file:expr, $format:expr, $offset:expr, $fmt:expr, $($args:tt)*) => {
        $crate::types::Error::MalformedImage {
            file_name: $file.name.clone(),
            format: $format,
            offset: $offset,
            reason: format!($fmt, $($args)*).into(),
        }
    };
}
