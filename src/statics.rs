// Central place for user-facing strings and other non-localized constants.

// Unit types known to the rules store.
pub const UNIT_TYPE_INFANTRY: &str = "infantry";
pub const UNIT_TYPE_VEHICLE: &str = "vehicle";
pub const UNIT_TYPE_AIRCRAFT: &str = "aircraft";
pub const UNIT_TYPE_BUILDING: &str = "building";
pub const UNIT_TYPES: &[&str] = &[
    UNIT_TYPE_INFANTRY,
    UNIT_TYPE_VEHICLE,
    UNIT_TYPE_AIRCRAFT,
    UNIT_TYPE_BUILDING,
];

// Catalog group for units without a type.
pub const GROUP_OTHER: &str = "Other";

// Property whose value is looked up in the translation table for display names.
pub const PROP_UI_NAME: &str = "UIName";

pub const DEFAULT_LANGUAGE: &str = "en";

// English strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "ra2ed: Red Alert 2 unit editor";
pub const EN_PROMPT: &str = "ra2ed> ";

pub const EN_HELP: &str = "\
Commands:
  list                               show the unit catalog
  select <type> <id>                 load a unit (unsaved edits are discarded)
  show                               show the current draft
  set <name|id|type> <value>         edit a basic field
  prop <index> <key|value|comment> <text>
                                     edit a property field
  add                                append an empty property
  rm <index>                         delete a property
  suggest <text>                     list known property keys containing <text>
  accept <index> <key>               replace a property key with a suggestion
  commit                             save the draft
  new <type> <name>                  create and select a unit
  delete                             delete the selected unit
  open [path]                        (re)load the store file
  save                               write the store file
  help                               this text
  quit                               leave";

pub const EN_NO_SELECTION: &str = "No unit selected. Use `select <type> <id>`.";
pub const EN_EMPTY_CATALOG: &str = "The catalog is empty.";
pub const EN_NO_SUGGESTIONS: &str = "No matching keys.";
pub const EN_READ_ONLY_MARK: &str = " (read-only)";

pub const EN_ERR_EMPTY_UKEY: &str = "property ukey must not be empty";
pub const EN_ERR_NO_FILE: &str = "no file selected";
pub const EN_ERR_BASE_UNIT: &str = "cannot delete a unit from the base rules";
