//! Prompt construction.
//!
//! Every builder here is a pure function of already-loaded records.

use reelforge_core::{Character, Drama, FrameType, Scene, Storyboard};

/// Placeholder when a drama has no characters yet.
const NO_CHARACTERS: &str = "none";

/// Placeholder when an episode has no extracted scenes yet.
const NO_SCENES: &str = "none";

/// System prompt for character generation.
pub const CHARACTER_SYSTEM_PROMPT: &str = "You are a screenwriter designing the cast of a short drama. \
Give every character a distinct motivation, a concrete visual appearance suitable for illustration, \
and a voice style. Output only valid JSON.";

/// System prompt for storyboard decomposition.
pub const STORYBOARD_SYSTEM_PROMPT: &str = "You are a storyboard artist breaking a script into shots. \
Every shot focuses on a single action. Cover the whole script: no line of content may be skipped \
or summarized away. Output only valid JSON.";

/// Build the user prompt for character generation.
pub fn character_prompt(drama: &Drama, outline: Option<&str>, count: u32) -> String {
    let outline = outline
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| drama_outline(drama));

    format!(
        "[Story outline]\n{outline}\n\n\
         [Task]\nCreate {count} characters for this story.\n\n\
         [Output format]\n\
         {{\"characters\": [{{\"name\": \"...\", \"role\": \"protagonist|antagonist|supporting\", \
         \"description\": \"...\", \"personality\": \"...\", \"appearance\": \"...\", \
         \"voice_style\": \"...\"}}]}}"
    )
}

/// Title, synopsis and genre of a drama, one per line.
fn drama_outline(drama: &Drama) -> String {
    let mut lines = vec![format!("Title: {}", drama.title)];
    if let Some(description) = non_empty(drama.description.as_deref()) {
        lines.push(format!("Synopsis: {description}"));
    }
    if let Some(genre) = non_empty(drama.genre.as_deref()) {
        lines.push(format!("Genre: {genre}"));
    }
    lines.join("\n")
}

/// `[{"id": 1, "name": "..."}]` listing, or a placeholder.
pub fn character_list(characters: &[Character]) -> String {
    if characters.is_empty() {
        return NO_CHARACTERS.to_string();
    }
    let entries: Vec<String> = characters
        .iter()
        .map(|c| serde_json::json!({"id": c.id, "name": c.name}).to_string())
        .collect();
    format!("[{}]", entries.join(", "))
}

/// `[{"id": 1, "location": "...", "time": "..."}]` listing, or a placeholder.
pub fn scene_list(scenes: &[Scene]) -> String {
    if scenes.is_empty() {
        return NO_SCENES.to_string();
    }
    let entries: Vec<String> = scenes
        .iter()
        .map(|s| serde_json::json!({"id": s.id, "location": s.location, "time": s.time}).to_string())
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Build the user prompt for storyboard decomposition.
pub fn storyboard_prompt(script: &str, characters: &[Character], scenes: &[Scene]) -> String {
    format!(
        "[Characters]\n{characters}\n\
         Only reference characters from this list, by id, in the \"characters\" field.\n\n\
         [Scenes]\n{scenes}\n\
         When a shot takes place in one of these scenes, set \"scene_id\" to its id; otherwise null.\n\n\
         [Script]\n{script}\n\n\
         [Shot elements]\n\
         1. title: three to five words summarizing the shot\n\
         2. time: time of day with lighting detail\n\
         3. location: full place description with layout and props\n\
         4. shot_type, angle, movement: framing, camera angle and camera movement\n\
         5. action: who does what, with body and facial detail\n\
         6. dialogue: the complete line or monologue, empty when silent\n\
         7. result: immediate visible consequence of the action\n\
         8. atmosphere: light, palette, ambient sound and mood\n\
         9. emotion: intended audience emotion and intensity\n\
         10. bgm_prompt and sound_effect: music and key sound effects, empty when none\n\
         11. duration: seconds, an integer between 4 and 12\n\n\
         [Output format]\n\
         {{\"storyboards\": [{{\"shot_number\": 1, \"title\": \"\", \"shot_type\": \"\", \"angle\": \"\", \
         \"time\": \"\", \"location\": \"\", \"scene_id\": null, \"movement\": \"\", \"action\": \"\", \
         \"dialogue\": \"\", \"result\": \"\", \"atmosphere\": \"\", \"emotion\": \"\", \"duration\": 6, \
         \"bgm_prompt\": \"\", \"sound_effect\": \"\", \"characters\": [], \"is_primary\": true}}]}}",
        characters = character_list(characters),
        scenes = scene_list(scenes),
    )
}

/// System prompt for one frame of a shot.
pub fn frame_system_prompt(frame_type: FrameType) -> &'static str {
    match frame_type {
        FrameType::First => {
            "You write image-generation prompts for the opening frame of a film shot. \
             Describe the static composition before the action begins: setting, character \
             poses, lighting and framing. Respond with JSON {\"prompt\": \"...\", \"description\": \"...\"}."
        }
        FrameType::Key => {
            "You write image-generation prompts for the key frame of a film shot. \
             Capture the climax of the action with dynamic poses and motion cues. \
             Respond with JSON {\"prompt\": \"...\", \"description\": \"...\"}."
        }
        FrameType::Last | FrameType::Panel | FrameType::Action => {
            "You write image-generation prompts for the closing frame of a film shot. \
             Show the final state after the action and its visible result. \
             Respond with JSON {\"prompt\": \"...\", \"description\": \"...\"}."
        }
    }
}

/// Shot context handed to the frame prompt model, one labeled line per known field.
///
/// The scene comes from the linked scene record when present, else from the
/// shot's own location and time.
pub fn shot_context(shot: &Storyboard, scene: Option<&Scene>, characters: &[Character]) -> String {
    let spec = &shot.shot;
    let mut lines = Vec::new();

    if let Some(description) = non_empty(spec.description.as_deref()) {
        lines.push(format!("Shot description: {description}"));
    }
    match scene {
        Some(scene) => lines.push(format!("Scene: {}, {}", scene.location, scene.time)),
        None => {
            if let (Some(location), Some(time)) = (spec.location.as_deref(), spec.time.as_deref()) {
                lines.push(format!("Scene: {location}, {time}"));
            }
        }
    }
    if !characters.is_empty() {
        let names: Vec<&str> = characters.iter().map(|c| c.name.as_str()).collect();
        lines.push(format!("Characters: {}", names.join(", ")));
    }

    let labeled = [
        ("Action", spec.action.as_deref()),
        ("Result", spec.result.as_deref()),
        ("Dialogue", spec.dialogue.as_deref()),
        ("Atmosphere", spec.atmosphere.as_deref()),
        ("Shot type", spec.shot_type.as_deref()),
        ("Camera angle", spec.angle.as_deref()),
        ("Camera movement", spec.movement.as_deref()),
    ];
    for (label, value) in labeled {
        if let Some(value) = non_empty(value) {
            lines.push(format!("{label}: {value}"));
        }
    }

    lines.join("\n")
}

/// User prompt for one frame.
pub fn frame_prompt(context: &str) -> String {
    format!("[Shot information]\n{context}")
}

/// System prompt for background extraction, optionally naming a visual style.
pub fn background_system_prompt(style: Option<&str>) -> String {
    let style = non_empty(style).unwrap_or("cinematic anime");
    format!(
        "You are a background artist. Identify every distinct location and time of day in the \
         material and write one pure background image prompt for each, in {style} style. \
         Backgrounds never contain people or characters. Output only valid JSON."
    )
}

/// User prompt for extracting backgrounds from script text.
pub fn background_script_prompt(script: &str) -> String {
    format!(
        "[Script]\n{script}\n\n\
         [Output format]\n\
         {{\"backgrounds\": [{{\"location\": \"\", \"time\": \"\", \"atmosphere\": \"\", \
         \"prompt\": \"A pure background scene depicting ... at ..., no characters\"}}]}}"
    )
}

/// User prompt for extracting backgrounds from existing shots.
pub fn background_storyboard_prompt(shots: &[Storyboard]) -> String {
    let listing: String = shots
        .iter()
        .map(|shot| {
            let spec = &shot.shot;
            format!(
                "Shot {}:\nLocation: {}\nTime: {}\nAction: {}\nDescription: {}\n\n",
                spec.shot_number,
                spec.location.as_deref().unwrap_or_default(),
                spec.time.as_deref().unwrap_or_default(),
                spec.action.as_deref().unwrap_or_default(),
                spec.description.as_deref().unwrap_or_default(),
            )
        })
        .collect();

    format!(
        "[Shots]\n{listing}\
         [Output format]\n\
         {{\"backgrounds\": [{{\"location\": \"\", \"time\": \"\", \"prompt\": \"\", \
         \"scene_numbers\": [1, 2]}}]}}\n\
         scene_numbers lists every shot number using the background; every shot must be assigned."
    )
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
