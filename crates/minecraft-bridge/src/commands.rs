//! Game tools: argument validation and console command construction
//!
//! Each tool deserializes its arguments into a parameter struct and renders
//! one console command. Nothing here touches the server; invalid arguments
//! never reach stdin.

use crate::args::{
    Coordinate, ResourceId, int_in_range, optional, position, positive_int, required, single_line,
};
use craft_mcp_core::{CraftError, Result, ToolDef};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::warn;

/// Arguments of one game tool
pub trait ConsoleCommand: DeserializeOwned {
    /// Render the console command, validating what serde could not
    fn to_command(&self) -> Result<String>;
}

fn parse<T: ConsoleCommand>(arguments: Value) -> Result<String> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    let params: T = serde_json::from_value(arguments)
        .map_err(|e| CraftError::InvalidParams(e.to_string()))?;
    let command = params.to_command()?;
    single_line("command", &command)?;
    Ok(command)
}

/// Build the console command for `tool`
pub fn build_command(tool: &str, arguments: Value) -> Result<String> {
    match tool {
        "minecraft_fill" => parse::<FillParams>(arguments),
        "minecraft_setblock" => parse::<SetblockParams>(arguments),
        "minecraft_clone" => parse::<CloneParams>(arguments),
        "minecraft_summon" => parse::<SummonParams>(arguments),
        "minecraft_execute" => parse::<ExecuteParams>(arguments),
        "minecraft_give" => parse::<GiveParams>(arguments),
        "minecraft_teleport" => parse::<TeleportParams>(arguments),
        "minecraft_gamerule" => parse::<GameruleParams>(arguments),
        "minecraft_time" => parse::<TimeParams>(arguments),
        "minecraft_weather" => parse::<WeatherParams>(arguments),
        "minecraft_effect" => parse::<EffectParams>(arguments),
        "minecraft_difficulty" => parse::<DifficultyParams>(arguments),
        "minecraft_spawnpoint" => parse::<SpawnpointParams>(arguments),
        _ => Err(CraftError::UnknownTool(tool.to_string())),
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Replace,
    Destroy,
    Keep,
    Hollow,
    Outline,
}

impl FillMode {
    fn as_str(self) -> &'static str {
        match self {
            FillMode::Replace => "replace",
            FillMode::Destroy => "destroy",
            FillMode::Keep => "keep",
            FillMode::Hollow => "hollow",
            FillMode::Outline => "outline",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetblockMode {
    Replace,
    Destroy,
    Keep,
}

impl SetblockMode {
    fn as_str(self) -> &'static str {
        match self {
            SetblockMode::Replace => "replace",
            SetblockMode::Destroy => "destroy",
            SetblockMode::Keep => "keep",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillParams {
    pub x1: Coordinate,
    pub y1: Coordinate,
    pub z1: Coordinate,
    pub x2: Coordinate,
    pub y2: Coordinate,
    pub z2: Coordinate,
    pub block: ResourceId,
    pub old_block_handling: Option<FillMode>,
}

impl ConsoleCommand for FillParams {
    fn to_command(&self) -> Result<String> {
        let mut command = format!(
            "/fill {} {} {}",
            position(&self.x1, &self.y1, &self.z1),
            position(&self.x2, &self.y2, &self.z2),
            self.block
        );
        if let Some(mode) = self.old_block_handling {
            command.push(' ');
            command.push_str(mode.as_str());
        }
        Ok(command)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetblockParams {
    pub x: Coordinate,
    pub y: Coordinate,
    pub z: Coordinate,
    pub block: ResourceId,
    pub old_block_handling: Option<SetblockMode>,
}

impl ConsoleCommand for SetblockParams {
    fn to_command(&self) -> Result<String> {
        let mut command = format!(
            "/setblock {} {}",
            position(&self.x, &self.y, &self.z),
            self.block
        );
        if let Some(mode) = self.old_block_handling {
            command.push(' ');
            command.push_str(mode.as_str());
        }
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    Replace,
    Masked,
    Filtered,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneMode {
    Force,
    Move,
    Normal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneParams {
    pub x1: Coordinate,
    pub y1: Coordinate,
    pub z1: Coordinate,
    pub x2: Coordinate,
    pub y2: Coordinate,
    pub z2: Coordinate,
    pub x: Coordinate,
    pub y: Coordinate,
    pub z: Coordinate,
    pub mask_mode: Option<MaskMode>,
    pub clone_mode: Option<CloneMode>,
    pub filter_block: Option<String>,
}

impl ConsoleCommand for CloneParams {
    fn to_command(&self) -> Result<String> {
        let mut command = format!(
            "/clone {} {} {}",
            position(&self.x1, &self.y1, &self.z1),
            position(&self.x2, &self.y2, &self.z2),
            position(&self.x, &self.y, &self.z)
        );

        let filter_block = optional("filterBlock", &self.filter_block)?;
        match (self.mask_mode, filter_block) {
            (Some(MaskMode::Filtered), Some(block)) => {
                let block = ResourceId::parse(block)?;
                command.push_str(&format!(" filtered {}", block));
            }
            (Some(MaskMode::Filtered), None) => {
                return Err(CraftError::InvalidParams(
                    "filterBlock is required when maskMode is 'filtered'".to_string(),
                ));
            }
            (Some(MaskMode::Replace), _) => command.push_str(" replace"),
            (Some(MaskMode::Masked), _) => command.push_str(" masked"),
            (None, Some(_)) => {
                return Err(CraftError::InvalidParams(
                    "maskMode must be specified when filterBlock is provided".to_string(),
                ));
            }
            (None, None) => {}
        }

        if let Some(mode) = self.clone_mode {
            // cloneMode is only valid after a mask mode
            if self.mask_mode.is_none() {
                command.push_str(" replace");
            }
            command.push_str(match mode {
                CloneMode::Force => " force",
                CloneMode::Move => " move",
                CloneMode::Normal => " normal",
            });
        }
        Ok(command)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonParams {
    pub entity: String,
    pub x: Coordinate,
    pub y: Coordinate,
    pub z: Coordinate,
    pub nbt: Option<String>,
}

impl ConsoleCommand for SummonParams {
    fn to_command(&self) -> Result<String> {
        let entity = required("entity", &self.entity)?;
        if !entity.contains(':') {
            warn!(entity, "Entity ID has no namespace, the server assumes minecraft:");
        }

        let mut command = format!(
            "/summon {} {}",
            entity,
            position(&self.x, &self.y, &self.z)
        );
        if let Some(nbt) = optional("nbt", &self.nbt)? {
            if !(nbt.starts_with('{') && nbt.ends_with('}')) {
                return Err(CraftError::InvalidParams(format!(
                    "invalid NBT format: {} (must be enclosed in {{}})",
                    nbt
                )));
            }
            command.push(' ');
            command.push_str(nbt);
        }
        Ok(command)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteParams {
    pub subcommands: String,
}

impl ConsoleCommand for ExecuteParams {
    fn to_command(&self) -> Result<String> {
        let subcommands = required("subcommands", &self.subcommands)?;
        if !subcommands.contains(" run ") {
            return Err(CraftError::InvalidParams(
                "execute command must contain 'run' subcommand".to_string(),
            ));
        }
        Ok(format!("/execute {}", subcommands))
    }
}

#[derive(Debug, Deserialize)]
pub struct GiveParams {
    pub target: String,
    pub item: String,
    pub amount: Option<f64>,
}

impl ConsoleCommand for GiveParams {
    fn to_command(&self) -> Result<String> {
        let target = required("target", &self.target)?;
        let item = required("item", &self.item)?;
        if !item.contains(':') {
            warn!(item, "Item ID has no namespace, the server assumes minecraft:");
        }
        let amount = match self.amount {
            Some(amount) => positive_int("amount", amount)?,
            None => 1,
        };
        Ok(format!("/give {} {} {}", target, item, amount))
    }
}

#[derive(Debug, Deserialize)]
pub struct TeleportParams {
    pub target: String,
    /// Coordinates `x y z` or an entity selector
    pub destination: String,
    /// `yaw pitch`
    pub rotation: Option<String>,
}

impl ConsoleCommand for TeleportParams {
    fn to_command(&self) -> Result<String> {
        let target = required("target", &self.target)?;
        let destination = required("destination", &self.destination)?;
        let mut command = format!("/teleport {} {}", target, destination);

        if let Some(rotation) = optional("rotation", &self.rotation)? {
            let parts: Vec<&str> = rotation.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(CraftError::InvalidParams(format!(
                    "invalid rotation format: {} (expected 'yaw pitch')",
                    rotation
                )));
            }
            for part in &parts {
                Coordinate::parse(part).map_err(|_| {
                    CraftError::InvalidParams(format!("invalid rotation value: {}", part))
                })?;
            }
            command.push(' ');
            command.push_str(&parts.join(" "));
        }
        Ok(command)
    }
}

#[derive(Debug, Deserialize)]
pub struct GameruleParams {
    pub rule: String,
    /// Omitted to query the current value
    pub value: Option<Value>,
}

impl ConsoleCommand for GameruleParams {
    fn to_command(&self) -> Result<String> {
        let rule = required("rule", &self.rule)?;
        let value = match &self.value {
            None | Some(Value::Null) => return Ok(format!("/gamerule {}", rule)),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => (n.as_f64().unwrap_or_default() as i64).to_string(),
            },
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(CraftError::InvalidParams(format!(
                    "invalid value type for gamerule: {}",
                    other
                )));
            }
        };
        Ok(format!("/gamerule {} {}", rule, value))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSubcommand {
    Set,
    Add,
    Query,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSpec {
    Daytime,
    Gametime,
    Day,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeParams {
    pub subcommand: TimeSubcommand,
    /// Time for `set` and `add`, e.g. `day`, `1000`, `2d`
    pub value: Option<String>,
    pub time_spec: Option<TimeSpec>,
}

impl ConsoleCommand for TimeParams {
    fn to_command(&self) -> Result<String> {
        let (subcommand, argument) = match self.subcommand {
            TimeSubcommand::Query => {
                let spec = self.time_spec.ok_or_else(|| {
                    CraftError::InvalidParams("missing required parameter: timeSpec".to_string())
                })?;
                let spec = match spec {
                    TimeSpec::Daytime => "daytime",
                    TimeSpec::Gametime => "gametime",
                    TimeSpec::Day => "day",
                };
                ("query", spec)
            }
            sub => {
                let value = optional("value", &self.value)?.ok_or_else(|| {
                    CraftError::InvalidParams("missing required parameter: value".to_string())
                })?;
                let name = if matches!(sub, TimeSubcommand::Set) { "set" } else { "add" };
                (name, value)
            }
        };
        Ok(format!("/time {} {}", subcommand, argument))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Clear,
    Rain,
    Thunder,
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    #[serde(rename = "type")]
    pub kind: WeatherKind,
    /// Seconds
    pub duration: Option<f64>,
}

impl ConsoleCommand for WeatherParams {
    fn to_command(&self) -> Result<String> {
        let kind = match self.kind {
            WeatherKind::Clear => "clear",
            WeatherKind::Rain => "rain",
            WeatherKind::Thunder => "thunder",
        };
        match self.duration {
            Some(duration) => Ok(format!(
                "/weather {} {}",
                kind,
                positive_int("duration", duration)?
            )),
            None => Ok(format!("/weather {}", kind)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSubcommand {
    Give,
    Clear,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectParams {
    pub subcommand: EffectSubcommand,
    pub target: String,
    pub effect: Option<String>,
    pub seconds: Option<f64>,
    pub amplifier: Option<f64>,
    pub hide_particles: Option<bool>,
}

impl ConsoleCommand for EffectParams {
    fn to_command(&self) -> Result<String> {
        let target = required("target", &self.target)?;
        let effect = optional("effect", &self.effect)?;

        let EffectSubcommand::Give = self.subcommand else {
            return Ok(match effect {
                Some(effect) => format!("/effect clear {} {}", target, effect),
                None => format!("/effect clear {}", target),
            });
        };

        let effect = effect.ok_or_else(|| {
            CraftError::InvalidParams("missing required parameter: effect".to_string())
        })?;
        let mut command = format!("/effect give {} {}", target, effect);

        // Each optional argument needs the ones before it
        let Some(seconds) = self.seconds else {
            return Ok(command);
        };
        command.push_str(&format!(" {}", positive_int("seconds", seconds)?));

        let Some(amplifier) = self.amplifier else {
            return Ok(command);
        };
        command.push_str(&format!(" {}", int_in_range("amplifier", amplifier, 0, 255)?));

        if let Some(hide) = self.hide_particles {
            command.push_str(&format!(" {}", hide));
        }
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "0")]
    Peaceful,
    #[serde(alias = "1")]
    Easy,
    #[serde(alias = "2")]
    Normal,
    #[serde(alias = "3")]
    Hard,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyParams {
    pub difficulty: Difficulty,
}

impl ConsoleCommand for DifficultyParams {
    fn to_command(&self) -> Result<String> {
        let difficulty = match self.difficulty {
            Difficulty::Peaceful => "peaceful",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        Ok(format!("/difficulty {}", difficulty))
    }
}

#[derive(Debug, Deserialize)]
pub struct SpawnpointParams {
    pub target: Option<String>,
    pub x: Option<Coordinate>,
    pub y: Option<Coordinate>,
    pub z: Option<Coordinate>,
}

impl ConsoleCommand for SpawnpointParams {
    fn to_command(&self) -> Result<String> {
        let mut command = "/spawnpoint".to_string();
        if let Some(target) = optional("target", &self.target)? {
            command.push(' ');
            command.push_str(target);
        }
        match (&self.x, &self.y, &self.z) {
            (Some(x), Some(y), Some(z)) => {
                if optional("target", &self.target)?.is_none() {
                    // A position needs an explicit target
                    command.push_str(" @s");
                }
                command.push(' ');
                command.push_str(&position(x, y, z));
            }
            (None, None, None) => {}
            _ => {
                return Err(CraftError::InvalidParams(
                    "x, y and z must be given together".to_string(),
                ));
            }
        }
        Ok(command)
    }
}

fn coord(description: &str) -> Value {
    json!({
        "type": ["string", "number"],
        "description": description
    })
}

fn text(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

fn choice(description: &str, values: &[&str]) -> Value {
    json!({
        "type": "string",
        "description": description,
        "enum": values
    })
}

/// Definitions of every game tool
pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "minecraft_fill",
            "Fill the specified region with blocks",
            json!({
                "type": "object",
                "properties": {
                    "x1": coord("Starting X coordinate"),
                    "y1": coord("Starting Y coordinate"),
                    "z1": coord("Starting Z coordinate"),
                    "x2": coord("Ending X coordinate"),
                    "y2": coord("Ending Y coordinate"),
                    "z2": coord("Ending Z coordinate"),
                    "block": text("Block ID (e.g., minecraft:stone)"),
                    "oldBlockHandling": choice(
                        "How to handle existing blocks",
                        &["replace", "destroy", "keep", "hollow", "outline"]
                    )
                },
                "required": ["x1", "y1", "z1", "x2", "y2", "z2", "block"]
            }),
        ),
        ToolDef::new(
            "minecraft_setblock",
            "Set a block at the specified position",
            json!({
                "type": "object",
                "properties": {
                    "x": coord("X coordinate"),
                    "y": coord("Y coordinate"),
                    "z": coord("Z coordinate"),
                    "block": text("Block ID (e.g., minecraft:torch[lit=true])"),
                    "oldBlockHandling": choice(
                        "How to handle the existing block",
                        &["replace", "destroy", "keep"]
                    )
                },
                "required": ["x", "y", "z", "block"]
            }),
        ),
        ToolDef::new(
            "minecraft_clone",
            "Clone blocks from one region to another",
            json!({
                "type": "object",
                "properties": {
                    "x1": coord("Source starting X coordinate"),
                    "y1": coord("Source starting Y coordinate"),
                    "z1": coord("Source starting Z coordinate"),
                    "x2": coord("Source ending X coordinate"),
                    "y2": coord("Source ending Y coordinate"),
                    "z2": coord("Source ending Z coordinate"),
                    "x": coord("Destination X coordinate"),
                    "y": coord("Destination Y coordinate"),
                    "z": coord("Destination Z coordinate"),
                    "maskMode": choice("Mask mode (default: replace)", &["replace", "masked", "filtered"]),
                    "cloneMode": choice("Clone mode (default: normal)", &["force", "move", "normal"]),
                    "filterBlock": text("Filter block ID, required when maskMode is 'filtered'")
                },
                "required": ["x1", "y1", "z1", "x2", "y2", "z2", "x", "y", "z"]
            }),
        ),
        ToolDef::new(
            "minecraft_summon",
            "Summon an entity at the specified position",
            json!({
                "type": "object",
                "properties": {
                    "entity": text("Entity ID (e.g., minecraft:pig)"),
                    "x": coord("X coordinate"),
                    "y": coord("Y coordinate"),
                    "z": coord("Z coordinate"),
                    "nbt": text("NBT data for the entity, enclosed in {}")
                },
                "required": ["entity", "x", "y", "z"]
            }),
        ),
        ToolDef::new(
            "minecraft_execute",
            "Execute a command with conditions. Build subcommands using 'as', 'at', 'positioned', 'if', 'unless', etc., ending with 'run <command>'.",
            json!({
                "type": "object",
                "properties": {
                    "subcommands": text("The full execute subcommand chain (e.g., 'as @a at @s if block ~ ~-1 ~ minecraft:grass_block run say Hello')")
                },
                "required": ["subcommands"]
            }),
        ),
        ToolDef::new(
            "minecraft_give",
            "Give an item to a player",
            json!({
                "type": "object",
                "properties": {
                    "target": text("Target player selector (e.g., @p, PlayerName)"),
                    "item": text("Item ID (e.g., minecraft:diamond_sword)"),
                    "amount": {
                        "type": "integer",
                        "description": "Amount (default: 1)",
                        "minimum": 1
                    }
                },
                "required": ["target", "item"]
            }),
        ),
        ToolDef::new(
            "minecraft_teleport",
            "Teleport entities",
            json!({
                "type": "object",
                "properties": {
                    "target": text("Target entity selector (e.g., @p, PlayerName)"),
                    "destination": text("Destination coordinates (x y z) or entity selector"),
                    "rotation": text("Rotation as 'yaw pitch'")
                },
                "required": ["target", "destination"]
            }),
        ),
        ToolDef::new(
            "minecraft_gamerule",
            "Query or set a game rule",
            json!({
                "type": "object",
                "properties": {
                    "rule": text("Game rule name (e.g., doDaylightCycle)"),
                    "value": {
                        "type": ["boolean", "integer", "string"],
                        "description": "New value; omit to query the current value"
                    }
                },
                "required": ["rule"]
            }),
        ),
        ToolDef::new(
            "minecraft_time",
            "Set, add to or query the world time",
            json!({
                "type": "object",
                "properties": {
                    "subcommand": choice("Time operation", &["set", "add", "query"]),
                    "value": text("Time value for set/add (e.g., day, night, 1000)"),
                    "timeSpec": choice("What to query", &["daytime", "gametime", "day"])
                },
                "required": ["subcommand"]
            }),
        ),
        ToolDef::new(
            "minecraft_weather",
            "Change the weather",
            json!({
                "type": "object",
                "properties": {
                    "type": choice("Weather type", &["clear", "rain", "thunder"]),
                    "duration": {
                        "type": "integer",
                        "description": "Duration in seconds",
                        "minimum": 1
                    }
                },
                "required": ["type"]
            }),
        ),
        ToolDef::new(
            "minecraft_effect",
            "Give or clear status effects",
            json!({
                "type": "object",
                "properties": {
                    "subcommand": choice("Effect operation", &["give", "clear"]),
                    "target": text("Target entity selector"),
                    "effect": text("Effect ID (e.g., minecraft:speed), required for give"),
                    "seconds": {
                        "type": "integer",
                        "description": "Duration in seconds",
                        "minimum": 1
                    },
                    "amplifier": {
                        "type": "integer",
                        "description": "Effect level minus one, requires seconds",
                        "minimum": 0,
                        "maximum": 255
                    },
                    "hideParticles": {
                        "type": "boolean",
                        "description": "Hide effect particles, requires amplifier"
                    }
                },
                "required": ["subcommand", "target"]
            }),
        ),
        ToolDef::new(
            "minecraft_difficulty",
            "Set the game difficulty",
            json!({
                "type": "object",
                "properties": {
                    "difficulty": choice(
                        "Difficulty level",
                        &["peaceful", "easy", "normal", "hard", "0", "1", "2", "3"]
                    )
                },
                "required": ["difficulty"]
            }),
        ),
        ToolDef::new(
            "minecraft_spawnpoint",
            "Set the spawn point of players",
            json!({
                "type": "object",
                "properties": {
                    "target": text("Target player selector (default: the executor)"),
                    "x": coord("X coordinate"),
                    "y": coord("Y coordinate"),
                    "z": coord("Z coordinate")
                }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(tool: &str, arguments: Value) -> Result<String> {
        build_command(tool, arguments)
    }

    #[test]
    fn test_every_tool_has_a_builder() {
        for tool in tool_defs() {
            let result = build(&tool.name, json!({}));
            assert!(
                !matches!(result, Err(CraftError::UnknownTool(_))),
                "{} has no builder",
                tool.name
            );
        }
        assert!(matches!(
            build("minecraft_explode", json!({})),
            Err(CraftError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_fill() {
        let command = build(
            "minecraft_fill",
            json!({
                "x1": "0", "y1": "0", "z1": "0",
                "x2": 1, "y2": "~1", "z2": "1",
                "block": "minecraft:stone",
                "oldBlockHandling": "hollow"
            }),
        )
        .unwrap();
        assert_eq!(command, "/fill 0 0 0 1 ~1 1 minecraft:stone hollow");

        let err = build(
            "minecraft_fill",
            json!({
                "x1": "0", "y1": "0", "z1": "0",
                "x2": "1", "y2": "1", "z2": "1",
                "block": "stone"
            }),
        );
        assert!(matches!(err, Err(CraftError::InvalidParams(_))));

        let err = build(
            "minecraft_fill",
            json!({
                "x1": "0", "y1": "0", "z1": "0",
                "x2": "1", "y2": "1", "z2": "1",
                "block": "minecraft:stone",
                "oldBlockHandling": "explode"
            }),
        );
        assert!(matches!(err, Err(CraftError::InvalidParams(_))));
    }

    #[test]
    fn test_setblock_rejects_bad_coordinate() {
        let err = build(
            "minecraft_setblock",
            json!({ "x": "north", "y": "64", "z": "0", "block": "minecraft:torch" }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("north"));
    }

    #[test]
    fn test_clone_modes() {
        let region = json!({
            "x1": "0", "y1": "0", "z1": "0",
            "x2": "5", "y2": "5", "z2": "5",
            "x": "10", "y": "0", "z": "10"
        });

        let mut args = region.clone();
        args["maskMode"] = json!("filtered");
        args["filterBlock"] = json!("minecraft:stone");
        args["cloneMode"] = json!("move");
        assert_eq!(
            build("minecraft_clone", args).unwrap(),
            "/clone 0 0 0 5 5 5 10 0 10 filtered minecraft:stone move"
        );

        let mut args = region.clone();
        args["maskMode"] = json!("filtered");
        assert!(build("minecraft_clone", args).is_err());

        let mut args = region.clone();
        args["filterBlock"] = json!("minecraft:stone");
        assert!(build("minecraft_clone", args).is_err());

        let mut args = region;
        args["cloneMode"] = json!("force");
        assert_eq!(
            build("minecraft_clone", args).unwrap(),
            "/clone 0 0 0 5 5 5 10 0 10 replace force"
        );
    }

    #[test]
    fn test_summon_nbt() {
        let args = json!({
            "entity": "minecraft:pig", "x": "~", "y": "~", "z": "~",
            "nbt": "{CustomName:'\"Bob\"'}"
        });
        assert_eq!(
            build("minecraft_summon", args).unwrap(),
            "/summon minecraft:pig ~ ~ ~ {CustomName:'\"Bob\"'}"
        );

        let args = json!({
            "entity": "minecraft:pig", "x": "0", "y": "0", "z": "0",
            "nbt": "CustomName:Bob"
        });
        assert!(build("minecraft_summon", args).is_err());
    }

    #[test]
    fn test_execute_requires_run() {
        assert_eq!(
            build("minecraft_execute", json!({ "subcommands": "as @a run say hi" })).unwrap(),
            "/execute as @a run say hi"
        );
        assert!(build("minecraft_execute", json!({ "subcommands": "as @a" })).is_err());
    }

    #[test]
    fn test_line_breaks_never_reach_console() {
        let err = build(
            "minecraft_execute",
            json!({ "subcommands": "as @a run say hi\nstop" }),
        )
        .unwrap_err();
        assert!(matches!(err, CraftError::InvalidParams(_)));
        assert!(err.to_string().contains("line breaks"));

        // Free-form values that skip the string helpers are caught as well
        assert!(
            build("minecraft_gamerule", json!({ "rule": "doDaylightCycle", "value": "true\rstop" }))
                .is_err()
        );
        assert!(
            build("minecraft_teleport", json!({ "target": "@p", "destination": "0 64 0", "rotation": "90\n0" }))
                .is_err()
        );
    }

    #[test]
    fn test_give_amount() {
        let args = json!({ "target": "@p", "item": "minecraft:diamond" });
        assert_eq!(build("minecraft_give", args).unwrap(), "/give @p minecraft:diamond 1");

        let args = json!({ "target": "@p", "item": "minecraft:diamond", "amount": 64 });
        assert_eq!(build("minecraft_give", args).unwrap(), "/give @p minecraft:diamond 64");

        let args = json!({ "target": "@p", "item": "minecraft:diamond", "amount": 0 });
        assert!(build("minecraft_give", args).is_err());

        let args = json!({ "target": "", "item": "minecraft:diamond" });
        assert!(build("minecraft_give", args).is_err());
    }

    #[test]
    fn test_teleport_rotation() {
        let args = json!({ "target": "@p", "destination": "0 64 0", "rotation": "90 ~" });
        assert_eq!(
            build("minecraft_teleport", args).unwrap(),
            "/teleport @p 0 64 0 90 ~"
        );

        let args = json!({ "target": "@p", "destination": "@e[limit=1]", "rotation": "90" });
        assert!(build("minecraft_teleport", args).is_err());
    }

    #[test]
    fn test_gamerule_values() {
        assert_eq!(
            build("minecraft_gamerule", json!({ "rule": "doDaylightCycle" })).unwrap(),
            "/gamerule doDaylightCycle"
        );
        assert_eq!(
            build("minecraft_gamerule", json!({ "rule": "keepInventory", "value": true })).unwrap(),
            "/gamerule keepInventory true"
        );
        assert_eq!(
            build("minecraft_gamerule", json!({ "rule": "randomTickSpeed", "value": 3 })).unwrap(),
            "/gamerule randomTickSpeed 3"
        );
        assert!(build("minecraft_gamerule", json!({ "rule": "x", "value": [1] })).is_err());
    }

    #[test]
    fn test_time() {
        assert_eq!(
            build("minecraft_time", json!({ "subcommand": "set", "value": "noon" })).unwrap(),
            "/time set noon"
        );
        assert_eq!(
            build("minecraft_time", json!({ "subcommand": "query", "timeSpec": "daytime" }))
                .unwrap(),
            "/time query daytime"
        );
        assert!(build("minecraft_time", json!({ "subcommand": "query" })).is_err());
        assert!(build("minecraft_time", json!({ "subcommand": "add" })).is_err());
        assert!(build("minecraft_time", json!({ "subcommand": "rewind", "value": "1" })).is_err());
    }

    #[test]
    fn test_weather() {
        assert_eq!(
            build("minecraft_weather", json!({ "type": "rain", "duration": 600 })).unwrap(),
            "/weather rain 600"
        );
        assert_eq!(
            build("minecraft_weather", json!({ "type": "clear" })).unwrap(),
            "/weather clear"
        );
        assert!(build("minecraft_weather", json!({ "type": "snow" })).is_err());
        assert!(build("minecraft_weather", json!({ "type": "rain", "duration": 1.5 })).is_err());
    }

    #[test]
    fn test_effect() {
        let args = json!({
            "subcommand": "give", "target": "@p", "effect": "minecraft:speed",
            "seconds": 30, "amplifier": 2, "hideParticles": true
        });
        assert_eq!(
            build("minecraft_effect", args).unwrap(),
            "/effect give @p minecraft:speed 30 2 true"
        );

        // amplifier without seconds is not rendered
        let args = json!({
            "subcommand": "give", "target": "@p", "effect": "minecraft:speed", "amplifier": 2
        });
        assert_eq!(
            build("minecraft_effect", args).unwrap(),
            "/effect give @p minecraft:speed"
        );

        let args = json!({ "subcommand": "clear", "target": "@a" });
        assert_eq!(build("minecraft_effect", args).unwrap(), "/effect clear @a");

        let args = json!({ "subcommand": "give", "target": "@p" });
        assert!(build("minecraft_effect", args).is_err());

        let args = json!({
            "subcommand": "give", "target": "@p", "effect": "minecraft:speed",
            "seconds": 30, "amplifier": 300
        });
        assert!(build("minecraft_effect", args).is_err());
    }

    #[test]
    fn test_difficulty_accepts_numbers() {
        assert_eq!(
            build("minecraft_difficulty", json!({ "difficulty": "2" })).unwrap(),
            "/difficulty normal"
        );
        assert_eq!(
            build("minecraft_difficulty", json!({ "difficulty": "hard" })).unwrap(),
            "/difficulty hard"
        );
        assert!(build("minecraft_difficulty", json!({ "difficulty": "nightmare" })).is_err());
    }

    #[test]
    fn test_spawnpoint() {
        assert_eq!(build("minecraft_spawnpoint", Value::Null).unwrap(), "/spawnpoint");
        assert_eq!(
            build(
                "minecraft_spawnpoint",
                json!({ "target": "Steve", "x": "1", "y": "2", "z": "3" })
            )
            .unwrap(),
            "/spawnpoint Steve 1 2 3"
        );
        assert_eq!(
            build("minecraft_spawnpoint", json!({ "x": "1", "y": "2", "z": "3" })).unwrap(),
            "/spawnpoint @s 1 2 3"
        );
        assert!(build("minecraft_spawnpoint", json!({ "x": "1" })).is_err());
    }
}
