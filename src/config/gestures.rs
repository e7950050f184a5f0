use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::input::workspace::{InternalCommand, InternalError, INTERNAL_COMMAND};

/// Raw mapping loaded from configuration: family name to binding entries,
/// each entry being `<motion> [<fingers>] <command...>`.
pub type GestureMap = BTreeMap<String, Vec<String>>;

/// Gesture families reported by the touchpad itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceGesture {
    Swipe,
    Pinch,
}

impl DeviceGesture {
    pub const ALL: &'static [DeviceGesture] = &[DeviceGesture::Swipe, DeviceGesture::Pinch];

    /// The family that classifies this gesture at its end.
    pub fn classified(self) -> GestureFamily {
        match self {
            DeviceGesture::Swipe => GestureFamily::Swipe,
            DeviceGesture::Pinch => GestureFamily::Pinch,
        }
    }

    /// The generic hook family firing for `phase` of this gesture.
    pub fn hook(self, phase: HookPhase) -> GestureFamily {
        match (self, phase) {
            (DeviceGesture::Swipe, HookPhase::Begin) => GestureFamily::SwipeBeginHook,
            (DeviceGesture::Swipe, HookPhase::Update) => GestureFamily::SwipeUpdateHook,
            (DeviceGesture::Swipe, HookPhase::End) => GestureFamily::SwipeEndHook,
            (DeviceGesture::Pinch, HookPhase::Begin) => GestureFamily::PinchBeginHook,
            (DeviceGesture::Pinch, HookPhase::Update) => GestureFamily::PinchUpdateHook,
            (DeviceGesture::Pinch, HookPhase::End) => GestureFamily::PinchEndHook,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            DeviceGesture::Swipe => 0,
            DeviceGesture::Pinch => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Begin,
    Update,
    End,
}

impl HookPhase {
    pub const ALL: &'static [HookPhase] = &[HookPhase::Begin, HookPhase::Update, HookPhase::End];
}

/// How a family turns events into actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyBehavior {
    /// Accumulate over the whole gesture and discriminate a motion at the end.
    ClassifyAtEnd(DeviceGesture),
    /// Fire on every event of `phase`; eligible for delay arbitration.
    FireEveryEvent(DeviceGesture, HookPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureFamily {
    Swipe,
    Pinch,
    SwipeBeginHook,
    SwipeUpdateHook,
    SwipeEndHook,
    PinchBeginHook,
    PinchUpdateHook,
    PinchEndHook,
}

const SWIPE_MOTIONS: &[Motion] = &[
    Motion::Left,
    Motion::Right,
    Motion::Up,
    Motion::Down,
    Motion::LeftUp,
    Motion::LeftDown,
    Motion::RightUp,
    Motion::RightDown,
];
const PINCH_MOTIONS: &[Motion] = &[
    Motion::In,
    Motion::Out,
    Motion::Clockwise,
    Motion::Anticlockwise,
];
const HOOK_MOTIONS: &[Motion] = &[Motion::All];

impl GestureFamily {
    pub const ALL: &'static [GestureFamily] = &[
        GestureFamily::Swipe,
        GestureFamily::Pinch,
        GestureFamily::SwipeBeginHook,
        GestureFamily::SwipeUpdateHook,
        GestureFamily::SwipeEndHook,
        GestureFamily::PinchBeginHook,
        GestureFamily::PinchUpdateHook,
        GestureFamily::PinchEndHook,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GestureFamily::Swipe => "swipe",
            GestureFamily::Pinch => "pinch",
            GestureFamily::SwipeBeginHook => "swipe_begin",
            GestureFamily::SwipeUpdateHook => "swipe_update",
            GestureFamily::SwipeEndHook => "swipe_end",
            GestureFamily::PinchBeginHook => "pinch_begin",
            GestureFamily::PinchUpdateHook => "pinch_update",
            GestureFamily::PinchEndHook => "pinch_end",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.name() == normalized)
    }

    pub fn behavior(self) -> FamilyBehavior {
        use DeviceGesture::{Pinch, Swipe};
        match self {
            GestureFamily::Swipe => FamilyBehavior::ClassifyAtEnd(Swipe),
            GestureFamily::Pinch => FamilyBehavior::ClassifyAtEnd(Pinch),
            GestureFamily::SwipeBeginHook => FamilyBehavior::FireEveryEvent(Swipe, HookPhase::Begin),
            GestureFamily::SwipeUpdateHook => {
                FamilyBehavior::FireEveryEvent(Swipe, HookPhase::Update)
            }
            GestureFamily::SwipeEndHook => FamilyBehavior::FireEveryEvent(Swipe, HookPhase::End),
            GestureFamily::PinchBeginHook => FamilyBehavior::FireEveryEvent(Pinch, HookPhase::Begin),
            GestureFamily::PinchUpdateHook => {
                FamilyBehavior::FireEveryEvent(Pinch, HookPhase::Update)
            }
            GestureFamily::PinchEndHook => FamilyBehavior::FireEveryEvent(Pinch, HookPhase::End),
        }
    }

    pub fn device_gesture(self) -> DeviceGesture {
        match self.behavior() {
            FamilyBehavior::ClassifyAtEnd(gesture) => gesture,
            FamilyBehavior::FireEveryEvent(gesture, _) => gesture,
        }
    }

    pub fn is_hook(self) -> bool {
        matches!(self.behavior(), FamilyBehavior::FireEveryEvent(..))
    }

    pub fn supported_motions(self) -> &'static [Motion] {
        match self {
            GestureFamily::Swipe => SWIPE_MOTIONS,
            GestureFamily::Pinch => PINCH_MOTIONS,
            _ => HOOK_MOTIONS,
        }
    }

    /// Substring marking a motion that needs oblique or rotation discrimination.
    pub fn extended_marker(self) -> Option<&'static str> {
        match self {
            GestureFamily::Swipe => Some("_"),
            GestureFamily::Pinch => Some("clock"),
            _ => None,
        }
    }
}

impl fmt::Display for GestureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
    In,
    Out,
    Clockwise,
    Anticlockwise,
    All,
}

impl Motion {
    const ALL: &'static [Motion] = &[
        Motion::Left,
        Motion::Right,
        Motion::Up,
        Motion::Down,
        Motion::LeftUp,
        Motion::LeftDown,
        Motion::RightUp,
        Motion::RightDown,
        Motion::In,
        Motion::Out,
        Motion::Clockwise,
        Motion::Anticlockwise,
        Motion::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Motion::Left => "left",
            Motion::Right => "right",
            Motion::Up => "up",
            Motion::Down => "down",
            Motion::LeftUp => "left_up",
            Motion::LeftDown => "left_down",
            Motion::RightUp => "right_up",
            Motion::RightDown => "right_down",
            Motion::In => "in",
            Motion::Out => "out",
            Motion::Clockwise => "clockwise",
            Motion::Anticlockwise => "anticlockwise",
            Motion::All => "all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|motion| motion.as_str() == name)
    }

    /// Compound of a horizontal and a vertical base motion, e.g. `left` + `up`.
    pub fn oblique(horizontal: Motion, vertical: Motion) -> Option<Motion> {
        Some(match (horizontal, vertical) {
            (Motion::Left, Motion::Up) => Motion::LeftUp,
            (Motion::Left, Motion::Down) => Motion::LeftDown,
            (Motion::Right, Motion::Up) => Motion::RightUp,
            (Motion::Right, Motion::Down) => Motion::RightDown,
            _ => return None,
        })
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who runs a command once it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandHandler {
    External,
    Internal(InternalCommand),
}

/// Tokenized command with `x`/`y` placeholders left in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    tokens: Vec<String>,
    handler: CommandHandler,
}

impl CommandTemplate {
    pub fn parse(text: &str) -> Result<Self, BindingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BindingError::EmptyCommand);
        }
        let tokens = shell_words::split(text)
            .map_err(|err| BindingError::MalformedCommand(text.to_string(), err.to_string()))?;
        let Some(program) = tokens.first() else {
            return Err(BindingError::EmptyCommand);
        };

        let handler = if program == INTERNAL_COMMAND {
            let command = InternalCommand::parse(&tokens[1..])
                .map_err(|source| BindingError::InvalidInternal(text.to_string(), source))?;
            CommandHandler::Internal(command)
        } else {
            CommandHandler::External
        };

        Ok(Self { tokens, handler })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    /// Tokens with every literal `x` and `y` replaced by the coordinates.
    pub fn render(&self, coords: [f64; 2]) -> Vec<String> {
        self.tokens
            .iter()
            .map(|token| match token.as_str() {
                "x" => coords[0].to_string(),
                "y" => coords[1].to_string(),
                _ => token.clone(),
            })
            .collect()
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(&self.tokens))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("unknown gesture type '{0}'")]
    UnknownFamily(String),
    #[error("motion '{motion}' is not supported by {family} gestures")]
    UnsupportedMotion {
        family: GestureFamily,
        motion: String,
    },
    #[error("no command configured")]
    EmptyCommand,
    #[error("cannot split command '{0}': {1}")]
    MalformedCommand(String, String),
    #[error("invalid internal command '{0}': {1}")]
    InvalidInternal(String, #[source] InternalError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureBinding {
    pub family: GestureFamily,
    pub motion: Motion,
    pub fingers: Option<u8>,
    pub command: CommandTemplate,
}

/// Parse `<motion> [<fingers>] <command...>` for `family`.
pub fn parse_binding(family: GestureFamily, text: &str) -> Result<GestureBinding, BindingError> {
    let text = text.trim();
    let (motion_str, rest) = split_first_word(text);
    let motion_str = motion_str.to_ascii_lowercase();

    let motion = Motion::from_name(&motion_str)
        .filter(|motion| family.supported_motions().contains(motion))
        .ok_or_else(|| BindingError::UnsupportedMotion {
            family,
            motion: motion_str.clone(),
        })?;

    // A fingers token that is not a single digit belongs to the command.
    let (fingers_str, command_str) = split_first_word(rest);
    let (fingers, command_str) = match fingers_str.as_bytes() {
        [digit] if digit.is_ascii_digit() => (Some(digit - b'0'), command_str),
        _ => (None, rest),
    };

    let command = CommandTemplate::parse(command_str)?;

    Ok(GestureBinding {
        family,
        motion,
        fingers,
        command,
    })
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

#[derive(Debug, Default, Clone)]
struct FamilyBindings {
    exact: HashMap<(Motion, u8), CommandTemplate>,
    wildcard: HashMap<Motion, CommandTemplate>,
    has_extended: bool,
}

/// Validated gesture bindings for every family.
#[derive(Debug, Default, Clone)]
pub struct ActionTable {
    families: HashMap<GestureFamily, FamilyBindings>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: GestureBinding) {
        let family = binding.family;
        let entry = self.families.entry(family).or_default();

        if let Some(marker) = family.extended_marker() {
            if binding.motion.as_str().contains(marker) {
                entry.has_extended = true;
            }
        }

        let replaced = match binding.fingers {
            Some(fingers) => entry
                .exact
                .insert((binding.motion, fingers), binding.command)
                .is_some(),
            None => entry
                .wildcard
                .insert(binding.motion, binding.command)
                .is_some(),
        };
        if replaced {
            warn!(
                family = %family,
                motion = %binding.motion,
                fingers = ?binding.fingers,
                "duplicate gesture definition, new entry replaces the previous one"
            );
        }
    }

    pub fn add(&mut self, family: GestureFamily, text: &str) -> Result<(), BindingError> {
        let binding = parse_binding(family, text)?;
        self.insert(binding);
        Ok(())
    }

    /// Exact (motion, fingers) first, then the motion-only binding.
    pub fn resolve(
        &self,
        family: GestureFamily,
        motion: Motion,
        fingers: u8,
    ) -> Option<&CommandTemplate> {
        let bindings = self.families.get(&family)?;
        bindings
            .exact
            .get(&(motion, fingers))
            .or_else(|| bindings.wildcard.get(&motion))
    }

    pub fn has_extended(&self, family: GestureFamily) -> bool {
        self.families
            .get(&family)
            .is_some_and(|bindings| bindings.has_extended)
    }

    /// Whether any binding of `family` could fire for `fingers`.
    pub fn binds_fingers(&self, family: GestureFamily, fingers: u8) -> bool {
        self.families.get(&family).is_some_and(|bindings| {
            !bindings.wildcard.is_empty()
                || bindings.exact.keys().any(|(_, bound)| *bound == fingers)
        })
    }

    pub fn len(&self) -> usize {
        self.families
            .values()
            .map(|bindings| bindings.exact.len() + bindings.wildcard.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bindings ordered by family, motion and finger count.
    pub fn bindings(&self) -> Vec<(GestureFamily, Motion, Option<u8>, &CommandTemplate)> {
        let mut out: Vec<_> = self
            .families
            .iter()
            .flat_map(|(family, bindings)| {
                let exact = bindings
                    .exact
                    .iter()
                    .map(move |((motion, fingers), cmd)| (*family, *motion, Some(*fingers), cmd));
                let wildcard = bindings
                    .wildcard
                    .iter()
                    .map(move |(motion, cmd)| (*family, *motion, None, cmd));
                exact.chain(wildcard)
            })
            .collect();
        out.sort_by_key(|(family, motion, fingers, _)| (*family, *motion, *fingers));
        out
    }
}

/// Failure to build one configured entry, with the entry for context.
#[derive(Debug, Error)]
#[error("gesture {family} '{entry}': {source}")]
pub struct EntryError {
    pub family: String,
    pub entry: String,
    #[source]
    pub source: BindingError,
}

pub fn build_table(map: &GestureMap) -> Result<ActionTable, EntryError> {
    let mut table = ActionTable::new();

    for (family_name, entries) in map {
        for entry in entries {
            let wrap = |source| EntryError {
                family: family_name.clone(),
                entry: entry.clone(),
                source,
            };
            let family = GestureFamily::from_name(family_name)
                .ok_or_else(|| wrap(BindingError::UnknownFamily(family_name.clone())))?;
            table.add(family, entry).map_err(wrap)?;
        }
    }

    if table.is_empty() {
        info!("no gesture bindings configured");
    } else {
        info!("loaded {} gesture bindings", table.len());
    }

    Ok(table)
}

pub fn default_gesture_map() -> GestureMap {
    GestureMap::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_motion_fingers_and_command() {
        let binding = parse_binding(GestureFamily::Swipe, "left 3 xdotool key super+Right")
            .expect("valid binding");
        assert_eq!(binding.motion, Motion::Left);
        assert_eq!(binding.fingers, Some(3));
        assert_eq!(
            binding.command.tokens(),
            &["xdotool", "key", "super+Right"]
        );
        assert_eq!(binding.command.handler(), &CommandHandler::External);
    }

    #[test]
    fn non_digit_fingers_token_folds_into_command() {
        let binding = parse_binding(GestureFamily::Pinch, "in 12 zoom --out").unwrap();
        assert_eq!(binding.fingers, None);
        assert_eq!(binding.command.tokens(), &["12", "zoom", "--out"]);

        let binding = parse_binding(GestureFamily::Pinch, "OUT xdotool key ctrl+plus").unwrap();
        assert_eq!(binding.motion, Motion::Out);
        assert_eq!(binding.fingers, None);
        assert_eq!(binding.command.tokens()[0], "xdotool");
    }

    #[test]
    fn rejects_motion_outside_family() {
        let err = parse_binding(GestureFamily::Pinch, "left echo hi").expect_err("invalid");
        assert_eq!(
            err,
            BindingError::UnsupportedMotion {
                family: GestureFamily::Pinch,
                motion: "left".into(),
            }
        );
        assert!(parse_binding(GestureFamily::SwipeUpdateHook, "left echo").is_err());
        assert!(parse_binding(GestureFamily::SwipeUpdateHook, "all 3 echo x y").is_ok());
    }

    #[test]
    fn rejects_empty_and_malformed_commands() {
        assert_eq!(
            parse_binding(GestureFamily::Swipe, "left 3").unwrap_err(),
            BindingError::EmptyCommand
        );
        assert_eq!(
            parse_binding(GestureFamily::Swipe, "up").unwrap_err(),
            BindingError::EmptyCommand
        );
        assert!(matches!(
            parse_binding(GestureFamily::Swipe, "up notify-send 'unterminated"),
            Err(BindingError::MalformedCommand(..))
        ));
    }

    #[test]
    fn internal_commands_are_validated() {
        let binding = parse_binding(GestureFamily::Swipe, "up 4 _internal ws_up --wrap").unwrap();
        assert!(matches!(
            binding.command.handler(),
            CommandHandler::Internal(_)
        ));
        assert!(matches!(
            parse_binding(GestureFamily::Swipe, "up _internal fly_away"),
            Err(BindingError::InvalidInternal(_, InternalError::UnknownArgument(arg))) if arg == "fly_away"
        ));
    }

    #[test]
    fn exact_binding_beats_wildcard() {
        let mut table = ActionTable::new();
        table.add(GestureFamily::Swipe, "left 3 cmd-a").unwrap();
        table.add(GestureFamily::Swipe, "left cmd-b").unwrap();

        let three = table.resolve(GestureFamily::Swipe, Motion::Left, 3).unwrap();
        assert_eq!(three.tokens(), &["cmd-a"]);
        let four = table.resolve(GestureFamily::Swipe, Motion::Left, 4).unwrap();
        assert_eq!(four.tokens(), &["cmd-b"]);
        assert!(table.resolve(GestureFamily::Swipe, Motion::Right, 3).is_none());
    }

    #[test]
    fn extended_flag_follows_compound_motions() {
        let mut table = ActionTable::new();
        table.add(GestureFamily::Swipe, "right 3 a").unwrap();
        table.add(GestureFamily::Pinch, "in b").unwrap();
        assert!(!table.has_extended(GestureFamily::Swipe));
        assert!(!table.has_extended(GestureFamily::Pinch));

        table.add(GestureFamily::Swipe, "right_down 3 c").unwrap();
        table.add(GestureFamily::Pinch, "anticlockwise d").unwrap();
        assert!(table.has_extended(GestureFamily::Swipe));
        assert!(table.has_extended(GestureFamily::Pinch));
    }

    #[test]
    fn duplicate_key_keeps_last_entry() {
        let mut table = ActionTable::new();
        table.add(GestureFamily::Swipe, "up 3 first").unwrap();
        table.add(GestureFamily::Swipe, "up 3 second").unwrap();
        assert_eq!(table.len(), 1);
        let cmd = table.resolve(GestureFamily::Swipe, Motion::Up, 3).unwrap();
        assert_eq!(cmd.tokens(), &["second"]);
    }

    #[test]
    fn render_substitutes_placeholders_only() {
        let cmd = CommandTemplate::parse("xdotool mousemove_relative -- x y xy").unwrap();
        assert_eq!(
            cmd.render([12.5, -3.0]),
            vec!["xdotool", "mousemove_relative", "--", "12.5", "-3", "xy"]
        );
    }

    #[test]
    fn build_table_reports_entry_context() {
        let mut map = GestureMap::new();
        map.insert("swipe".into(), vec!["left 3 echo ok".into()]);
        map.insert("hold".into(), vec!["all 3 echo".into()]);

        let err = build_table(&map).expect_err("hold is not a gesture type");
        assert_eq!(err.family, "hold");
        assert_eq!(err.source, BindingError::UnknownFamily("hold".into()));
    }

    #[test]
    fn binds_fingers_sees_wildcards() {
        let mut table = ActionTable::new();
        table.add(GestureFamily::SwipeUpdateHook, "all 3 move x y").unwrap();
        assert!(table.binds_fingers(GestureFamily::SwipeUpdateHook, 3));
        assert!(!table.binds_fingers(GestureFamily::SwipeUpdateHook, 4));

        table.add(GestureFamily::PinchEndHook, "all done").unwrap();
        assert!(table.binds_fingers(GestureFamily::PinchEndHook, 2));
    }
}
