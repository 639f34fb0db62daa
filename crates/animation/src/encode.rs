use reuploader_protocol::animation::{AnimationPayload, Keyframe, Pose};
use reuploader_protocol::constants::MAX_POSE_DEPTH;

/// CFrame component tags: 3 translation, then the 9 rotation-matrix
/// entries row-major. Must stay aligned with the 12-float transform.
const CFRAME_TAGS: [&str; 12] = [
    "X", "Y", "Z", "R00", "R01", "R02", "R10", "R11", "R12", "R20", "R21", "R22",
];

/// Errors from encoding a structured animation description.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("keyframe {index} has no name")]
    UnnamedKeyframe { index: usize },

    #[error("pose under keyframe '{keyframe}' has no name")]
    UnnamedPose { keyframe: String },

    #[error("pose '{name}' transform has {got} components, expected 12")]
    BadTransform { name: String, got: usize },

    #[error("pose '{name}' exceeds maximum nesting depth {max}")]
    PoseTooDeep { name: String, max: usize },
}

/// Encodes an animation description into an XML scene document.
///
/// The document holds a single `KeyframeSequence` item named after
/// `display_name`, with one child `Keyframe` item per keyframe in input
/// order and recursively nested `Pose` items preserving sibling order.
pub fn encode(anim: &AnimationPayload, display_name: &str) -> Result<Vec<u8>, BuildError> {
    let mut out = String::with_capacity(1024);
    let mut referent = 0usize;

    out.push_str("<roblox version=\"4\">\n");

    open_item(&mut out, 1, "KeyframeSequence", &mut referent);
    open_properties(&mut out, 2);
    write_string(&mut out, 3, "Name", display_name);
    write_bool(&mut out, 3, "Loop", anim.looped);
    write_token(&mut out, 3, "Priority", anim.priority);
    close_properties(&mut out, 2);

    for (index, kf) in anim.keyframes.iter().enumerate() {
        write_keyframe(&mut out, kf, index, 2, &mut referent)?;
    }

    close_item(&mut out, 1);
    out.push_str("</roblox>\n");

    Ok(out.into_bytes())
}

fn write_keyframe(
    out: &mut String,
    kf: &Keyframe,
    index: usize,
    depth: usize,
    referent: &mut usize,
) -> Result<(), BuildError> {
    if kf.name.is_empty() {
        return Err(BuildError::UnnamedKeyframe { index });
    }

    open_item(out, depth, "Keyframe", referent);
    open_properties(out, depth + 1);
    write_string(out, depth + 1, "Name", &kf.name);
    write_float(out, depth + 1, "Time", kf.time);
    close_properties(out, depth + 1);

    for pose in &kf.poses {
        write_pose(out, pose, &kf.name, depth + 1, 1, referent)?;
    }

    close_item(out, depth);
    Ok(())
}

fn write_pose(
    out: &mut String,
    pose: &Pose,
    keyframe: &str,
    depth: usize,
    nesting: usize,
    referent: &mut usize,
) -> Result<(), BuildError> {
    if pose.name.is_empty() {
        return Err(BuildError::UnnamedPose {
            keyframe: keyframe.to_string(),
        });
    }
    if nesting > MAX_POSE_DEPTH {
        return Err(BuildError::PoseTooDeep {
            name: pose.name.clone(),
            max: MAX_POSE_DEPTH,
        });
    }
    if pose.transform.len() != CFRAME_TAGS.len() {
        return Err(BuildError::BadTransform {
            name: pose.name.clone(),
            got: pose.transform.len(),
        });
    }

    open_item(out, depth, "Pose", referent);
    open_properties(out, depth + 1);
    write_string(out, depth + 1, "Name", &pose.name);
    write_float(out, depth + 1, "Weight", pose.weight);
    write_token(out, depth + 1, "EasingStyle", pose.easing_style);
    write_token(out, depth + 1, "EasingDirection", pose.easing_direction);

    indent(out, depth + 1);
    out.push_str("<CoordinateFrame name=\"CFrame\">\n");
    for (tag, value) in CFRAME_TAGS.iter().zip(&pose.transform) {
        indent(out, depth + 2);
        out.push('<');
        out.push_str(tag);
        out.push('>');
        push_float(out, *value);
        out.push_str("</");
        out.push_str(tag);
        out.push_str(">\n");
    }
    indent(out, depth + 1);
    out.push_str("</CoordinateFrame>\n");

    close_properties(out, depth + 1);

    for sub in &pose.sub_poses {
        write_pose(out, sub, keyframe, depth + 1, nesting + 1, referent)?;
    }

    close_item(out, depth);
    Ok(())
}

fn open_item(out: &mut String, depth: usize, class: &str, referent: &mut usize) {
    indent(out, depth);
    out.push_str(&format!(
        "<Item class=\"{class}\" referent=\"RBX{}\">\n",
        *referent
    ));
    *referent += 1;
}

fn close_item(out: &mut String, depth: usize) {
    indent(out, depth);
    out.push_str("</Item>\n");
}

fn open_properties(out: &mut String, depth: usize) {
    indent(out, depth);
    out.push_str("<Properties>\n");
}

fn close_properties(out: &mut String, depth: usize) {
    indent(out, depth);
    out.push_str("</Properties>\n");
}

fn write_string(out: &mut String, depth: usize, name: &str, value: &str) {
    indent(out, depth);
    out.push_str("<string name=\"");
    out.push_str(name);
    out.push_str("\">");
    push_escaped(out, value);
    out.push_str("</string>\n");
}

fn write_bool(out: &mut String, depth: usize, name: &str, value: bool) {
    indent(out, depth);
    out.push_str("<bool name=\"");
    out.push_str(name);
    out.push_str("\">");
    out.push_str(if value { "true" } else { "false" });
    out.push_str("</bool>\n");
}

fn write_token(out: &mut String, depth: usize, name: &str, value: i32) {
    indent(out, depth);
    out.push_str("<token name=\"");
    out.push_str(name);
    out.push_str("\">");
    out.push_str(&value.to_string());
    out.push_str("</token>\n");
}

fn write_float(out: &mut String, depth: usize, name: &str, value: f32) {
    indent(out, depth);
    out.push_str("<float name=\"");
    out.push_str(name);
    out.push_str("\">");
    push_float(out, value);
    out.push_str("</float>\n");
}

/// Stable float formatting: Rust's shortest-roundtrip `Display`, which
/// is deterministic for a given bit pattern.
fn push_float(out: &mut String, value: f32) {
    out.push_str(&value.to_string());
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
