//! System-wide constants and default paths.

/// Working directory inside the image where the build context is staged.
pub const IMAGE_WORKDIR: &str = "/app";

/// Port the deployed process listens on (advisory `EXPOSE` metadata).
pub const DEFAULT_PORT: u16 = 5000;

/// Default listen address for `rolodex serve`.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Default address book file, relative to the process working directory.
pub const DEFAULT_DATA_FILE: &str = "addressbook.json";

/// Number of days ahead scanned by the `birthdays` command.
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// On-disk format version of the address book file.
pub const BOOK_FORMAT_VERSION: u32 = 1;

/// Textual date format used for birthdays (`DD.MM.YYYY`).
pub const BIRTHDAY_FORMAT: &str = "%d.%m.%Y";

/// Required number of digits in a phone number.
pub const PHONE_DIGITS: usize = 10;

/// Name of the build recipe file inside a build context.
pub const RECIPE_FILE: &str = "Dockerfile";

/// Name of the ignore file consulted when enumerating a build context.
pub const IGNORE_FILE: &str = ".dockerignore";

/// Binary name for the CLI, also the image entrypoint.
pub const BIN_NAME: &str = "rolodex";
