//! User-facing labels shown in the output areas

pub const CONSOLE_OUTPUT_LABEL: &str = "Console Output";

pub const EXIT_STATUS_LABEL: &str = "exit status";

pub const MACHINE_BUSY_LABEL: &str =
    "The machine running the examples may not be available or is busy, please try again now or come back later.";

pub const INTERNAL_ERROR_MESSAGE: &str =
    "Please report this issue to the site maintainers.";

pub const WIDGET_ERROR_NOTICE: &str = "An error has occured processing this widget.";

pub const LAB_COMPLETE_LABEL: &str = "Lab completed successfully.";

pub const LAB_FAILED_LABEL: &str = "Lab failed.";

pub const LAB_PENDING_LABEL: &str = "Lab in progress";
