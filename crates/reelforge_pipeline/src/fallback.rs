//! Deterministic compositions used when a model call or its parsing fails.

use reelforge_core::{Character, FrameType, NewScene, Scene, Storyboard};
use std::collections::HashMap;

/// Suffix naming the frame within its shot.
pub fn frame_suffix(frame_type: FrameType) -> &'static str {
    match frame_type {
        FrameType::First => "first frame, static shot",
        FrameType::Key => "key frame, dynamic action",
        FrameType::Last | FrameType::Panel | FrameType::Action => "last frame, final state",
    }
}

/// Default description of a single frame.
pub fn frame_description(frame_type: FrameType) -> &'static str {
    match frame_type {
        FrameType::First => "镜头开始的静态画面，展示初始状态",
        FrameType::Key => "动作高潮瞬间，展示关键动作",
        FrameType::Last | FrameType::Panel | FrameType::Action => "镜头结束画面，展示最终状态和结果",
    }
}

/// Frame prompt assembled from known fields: scene, character names,
/// atmosphere, style and the frame suffix.
///
/// # Examples
///
/// ```
/// use reelforge_core::{FrameType, ShotSpec, Storyboard};
/// use reelforge_pipeline::fallback_frame_prompt;
///
/// let shot = Storyboard {
///     id: 1,
///     episode_id: 1,
///     composed_image: None,
///     shot: ShotSpec { atmosphere: Some("misty".into()), ..ShotSpec::default() },
/// };
/// assert_eq!(
///     fallback_frame_prompt(&shot, None, &[], FrameType::Key),
///     "misty, anime style, key frame, dynamic action"
/// );
/// ```
pub fn fallback_frame_prompt(
    shot: &Storyboard,
    scene: Option<&Scene>,
    characters: &[Character],
    frame_type: FrameType,
) -> String {
    let mut parts = Vec::new();
    if let Some(scene) = scene {
        parts.push(format!("{}, {}", scene.location, scene.time));
    }
    parts.extend(characters.iter().map(|c| c.name.clone()));
    if let Some(atmosphere) = &shot.shot.atmosphere {
        parts.push(atmosphere.clone());
    }
    parts.push("anime style".to_string());
    parts.push(frame_suffix(frame_type).to_string());
    parts.join(", ")
}

/// One scene per distinct `(location, time)` pair among `shots`.
///
/// Shots missing either field are skipped. Scenes keep first-seen order and
/// take their prompt from the first shot's image prompt.
pub fn dedupe_backgrounds(shots: &[Storyboard]) -> Vec<NewScene> {
    let mut scenes: Vec<NewScene> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for shot in shots {
        let (Some(location), Some(time)) = (&shot.shot.location, &shot.shot.time) else {
            continue;
        };
        let key = (location.clone(), time.clone());
        match index.get(&key) {
            Some(&position) => {
                let scene = &mut scenes[position];
                scene.storyboard_count += 1;
                scene.shot_numbers.push(shot.shot.shot_number);
            }
            None => {
                index.insert(key, scenes.len());
                scenes.push(NewScene {
                    location: location.clone(),
                    time: time.clone(),
                    prompt: shot.shot.image_prompt.clone().unwrap_or_default(),
                    storyboard_count: 1,
                    shot_numbers: vec![shot.shot.shot_number],
                });
            }
        }
    }

    scenes
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_core::ShotSpec;

    fn shot(number: i32, location: Option<&str>, time: Option<&str>) -> Storyboard {
        Storyboard {
            id: number as i64 + 100,
            episode_id: 1,
            composed_image: None,
            shot: ShotSpec {
                shot_number: number,
                location: location.map(str::to_string),
                time: time.map(str::to_string),
                image_prompt: Some(format!("prompt {number}")),
                ..ShotSpec::default()
            },
        }
    }

    #[test]
    fn dedupes_by_exact_location_and_time() {
        let shots = vec![
            shot(1, Some("Harbor"), Some("Night")),
            shot(2, Some("Alley"), Some("Night")),
            shot(3, Some("Harbor"), Some("Night")),
            shot(4, Some("Harbor"), Some("Dawn")),
            shot(5, Some("Harbor"), None),
        ];
        let scenes = dedupe_backgrounds(&shots);

        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[0].location, "Harbor");
        assert_eq!(scenes[0].storyboard_count, 2);
        assert_eq!(scenes[0].shot_numbers, vec![1, 3]);
        assert_eq!(scenes[0].prompt, "prompt 1");
        assert_eq!(scenes[1].location, "Alley");
        assert_eq!(scenes[2].time, "Dawn");
    }

    #[test]
    fn fallback_prompt_lists_scene_and_characters_first() {
        let scene = Scene {
            id: 1,
            drama_id: 1,
            episode_id: None,
            location: "Harbor".into(),
            time: "Night".into(),
            prompt: String::new(),
            storyboard_count: 1,
            status: Default::default(),
            image_url: None,
        };
        let hero = Character {
            id: 2,
            drama_id: 1,
            name: "Lin".into(),
            role: None,
            description: None,
            personality: None,
            appearance: None,
            voice_style: None,
            image_url: None,
        };
        let prompt = fallback_frame_prompt(&shot(1, None, None), Some(&scene), &[hero], FrameType::First);
        assert_eq!(prompt, "Harbor, Night, Lin, anime style, first frame, static shot");
    }
}
