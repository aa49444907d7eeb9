// Raw printer channel control bytes
pub const LINE_FEED: u8 = 0x0A;
pub const FORM_FEED: u8 = 0x0C;
pub const CARRIAGE_RETURN: u8 = 0x0D;
pub const NUL: u8 = 0x00;

/// Maximum number of print positions on a line.
pub const MAX_LINE_LEN: usize = 132;

/// Last line number on a form; CDC vertical positioning never goes past it.
pub const FORM_LENGTH: i32 = 66;

// ASA carriage control characters
pub const ASA_SINGLE_SPACE: char = ' ';
pub const ASA_NEW_PAGE: char = '1';
pub const ASA_DOUBLE_SPACE: char = '0';
pub const ASA_TRIPLE_SPACE: char = '-';
pub const ASA_OVERSTRIKE: char = '+';

// CDC NOS extensions
pub const CDC_NEW_PAGE: char = '8';
pub const CDC_SKIP_TO_BOTTOM: char = '2';
pub const CDC_PAGE_EJECT: char = '3';
pub const CDC_SKIP_5: char = '4';
pub const CDC_SKIP_4: char = '5';
pub const CDC_SKIP_3: char = '6';
pub const CDC_TRIPLE_SPACE: char = '7';
pub const CDC_AUTO_EJECT_OFF: char = 'Q';
pub const CDC_AUTO_EJECT_ON: char = 'R';

/// Line a `2` control skips to (end of form minus two).
pub const CDC_BOTTOM_LINE: i32 = 64;
