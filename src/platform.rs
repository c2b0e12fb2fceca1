use crate::descriptor::Platform;

/// Normalizes a platform the way the traverser keys `images` by: lowercase
/// components, known variant aliases collapsed, default variants elided.
///
/// `arm64/v8` is the canonical form of `arm64` and is collapsed to it;
/// `amd64`'s default variant is elided entirely. Anything else passes
/// through lowercased.
pub fn normalize(platform: &Platform) -> Platform {
    let os = platform.os.to_lowercase();
    let architecture = platform.architecture.to_lowercase();
    let variant = platform.variant.as_ref().map(|v| v.to_lowercase());

    let variant = match (architecture.as_str(), variant.as_deref()) {
        ("arm64", Some("v8")) => None,
        ("amd64", Some("v1")) => None,
        (_, Some(v)) => Some(v.to_string()),
        (_, None) => None,
    };

    Platform {
        os,
        architecture,
        variant,
    }
}

/// Formats a normalized platform as `os/arch[/variant]`.
pub fn format(platform: &Platform) -> String {
    match &platform.variant {
        Some(variant) => format!("{}/{}/{}", platform.os, platform.architecture, variant),
        None => format!("{}/{}", platform.os, platform.architecture),
    }
}

/// Normalizes then formats in one step — the string the traverser uses to
/// key `images`.
pub fn normalized_string(platform: &Platform) -> String {
    format(&normalize(platform))
}
