// Central place for wire keys, sentinels, limits and display strings.
// Keep these out of the codec/sync code to reduce duplication and make tweaks safer.

// Monster-level keys.
pub const GP_KEY_BASE_ID: &str = "baseId";
pub const GP_KEY_NAME_ID: &str = "nameId";
pub const GP_KEY_ATTACK_RANGE: &str = "attackRange";
pub const GP_KEY_IS_RANGED: &str = "isRanged";
pub const GP_KEY_GAMBIT_PACK: &str = "gambitPack";

// Keys inside `gambitPack`.
pub const GP_KEY_LOOP_COUNT: &str = "loopCount";
pub const GP_KEY_TIME_LINES: &str = "timeLines";

// Rule keys.
pub const GP_RULE_CONDITION: &str = "condition";
pub const GP_RULE_ACTION_ID: &str = "actionId";
pub const GP_RULE_ACTION_PARAM: &str = "actionParam";
pub const GP_RULE_TIMING: &str = "timing";
pub const GP_RULE_COOL_DOWN: &str = "coolDown";
pub const GP_RULE_RADIUS: &str = "radius";
pub const GP_RULE_DESCRIPTION: &str = "description";
pub const GP_RULE_HP_THRESHOLD: &str = "hpThreshold";

// Shadow keys written on soft-disabled rules.
pub const GP_RULE_ORIGINAL_CONDITION: &str = "originalCondition";
pub const GP_RULE_ORIGINAL_ACTION_ID: &str = "originalActionId";

// Inert values written into the live keys of a disabled rule.
pub const GP_DISABLED_CONDITION: &str = "None";
pub const GP_DISABLED_ACTION_ID: i64 = 0;

// Wire value for an endless loop.
pub const GP_LOOP_INFINITE: i64 = -1;

// Limits.
pub const GP_TIMING_MIN: i64 = 0;
pub const GP_TIMING_MAX: i64 = 999;
pub const GP_HP_THRESHOLD_MIN: u8 = 1;
pub const GP_HP_THRESHOLD_MAX: u8 = 100;

// English display strings (EN_ prefix to make future localization easier).
pub const EN_UNKNOWN_ACTION: &str = "Unknown";
pub const EN_STATUS_ON: &str = "ON";
pub const EN_STATUS_OFF: &str = "OFF";
pub const EN_LOOP_INFINITE: &str = "Infinite";

pub const EN_COND_NONE: &str = "No target";
pub const EN_COND_SELF: &str = "Self";
pub const EN_COND_PLAYER: &str = "Player";
pub const EN_COND_PLAYER_AND_ALLY: &str = "Player & Ally";
pub const EN_COND_ALLY: &str = "Ally";
pub const EN_COND_BNPC: &str = "BNpc";
pub const EN_COND_TOP_HATE: &str = "Enemy: Top Aggro";
pub const EN_COND_HP_BELOW: &str = "HP < X%";

// Newline constants (used for output formatting).
pub const NL_LF: &str = "\n";
pub const NL_CRLF: &str = "\r\n";

pub const DEFAULT_INDENT: usize = 2;
