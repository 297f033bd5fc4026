//! Header and footer banners of a dump.

use std::time::Duration;

use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Session pragmas saved at the top of a dump.
const HEADER_PRAGMAS: &str = "\
/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;
/*!40101 SET @OLD_CHARACTER_SET_RESULTS=@@CHARACTER_SET_RESULTS */;
/*!40101 SET @OLD_COLLATION_CONNECTION=@@COLLATION_CONNECTION */;
 SET NAMES utf8mb4 ;
/*!40103 SET @OLD_TIME_ZONE=@@TIME_ZONE */;
/*!40103 SET TIME_ZONE='+00:00' */;
/*!40014 SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0 */;
/*!40014 SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0 */;
/*!40101 SET @OLD_SQL_MODE=@@SQL_MODE, SQL_MODE='NO_AUTO_VALUE_ON_ZERO' */;
/*!40111 SET @OLD_SQL_NOTES=@@SQL_NOTES, SQL_NOTES=0 */;
";

/// Restores what [`HEADER_PRAGMAS`] saved.
const FOOTER_PRAGMAS: &str = "
/*!40103 SET TIME_ZONE=@OLD_TIME_ZONE */;
/*!40101 SET SQL_MODE=@OLD_SQL_MODE */;
/*!40014 SET FOREIGN_KEY_CHECKS=@OLD_FOREIGN_KEY_CHECKS */;
/*!40014 SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS */;
/*!40101 SET CHARACTER_SET_CLIENT=@OLD_CHARACTER_SET_CLIENT */;
/*!40101 SET CHARACTER_SET_RESULTS=@OLD_CHARACTER_SET_RESULTS */;
/*!40101 SET COLLATION_CONNECTION=@OLD_COLLATION_CONNECTION */;
/*!40111 SET SQL_NOTES=@OLD_SQL_NOTES */;
";

/// Values shown in the header banner.
#[derive(Debug, Clone)]
pub struct HeaderInfo<'a> {
    pub host: &'a str,
    pub databases: &'a [String],
    pub started: DateTime<Local>,
    pub server_version: &'a str,
}

pub fn render_header(info: &HeaderInfo<'_>) -> String {
    format!(
        "-- mysql-dump\n\
         -- Server Host: {}\n\
         -- Database(s): {}\n\
         -- Start Time: {}\n\
         -- ------------------------------------------------------\n\
         -- Server version:\t{}\n\n{}",
        info.host,
        info.databases.join(", "),
        info.started.format(TIMESTAMP_FORMAT),
        info.server_version,
        HEADER_PRAGMAS
    )
}

pub fn render_footer(elapsed: Duration) -> String {
    format!(
        "{}\n\
         -- ----------------------------\n\
         -- Dumped by mysql-dump\n\
         -- Execution Time: {:.3?}\n\
         -- ----------------------------\n",
        FOOTER_PRAGMAS, elapsed
    )
}

/// Three-line `-- ` banner introducing a section.
pub fn section_banner(title: &str) -> String {
    format!(
        "-- ----------------------------\n-- {}\n-- ----------------------------\n",
        title
    )
}
