//! HTML and XML rendering for the news site.
//!
//! Post bodies arrive pre-rendered from the index; this module only wraps
//! them in page chrome. All rendering uses [maud](https://maud.lambda.xyz/),
//! so every dynamic value outside the stored post HTML is escaped.

pub mod components;
pub mod pages;
pub mod xml;

/// Client script that re-renders `<time data-format>` elements in the
/// viewer's locale and zone. The server text stays as the fallback.
pub const MAIN_JS: &str = r#"(function () {
  "use strict";
  var styles = {
    t: { timeStyle: "short" },
    T: { timeStyle: "medium" },
    d: { dateStyle: "short" },
    D: { dateStyle: "medium" },
    f: { dateStyle: "medium", timeStyle: "short" },
    F: { dateStyle: "long", timeStyle: "medium" }
  };
  var units = [
    ["year", 31536000], ["month", 2592000], ["week", 604800],
    ["day", 86400], ["hour", 3600], ["minute", 60], ["second", 1]
  ];
  function relative(date) {
    var diff = (date.getTime() - Date.now()) / 1000;
    var rtf = new Intl.RelativeTimeFormat(undefined, { numeric: "auto" });
    for (var i = 0; i < units.length; i++) {
      if (Math.abs(diff) >= units[i][1] || units[i][0] === "second") {
        return rtf.format(Math.round(diff / units[i][1]), units[i][0]);
      }
    }
  }
  document.querySelectorAll("time[data-format]").forEach(function (el) {
    var date = new Date(el.getAttribute("datetime"));
    if (isNaN(date.getTime())) return;
    var code = el.getAttribute("data-format");
    try {
      if (code === "R") {
        el.textContent = relative(date);
      } else if (styles[code]) {
        el.textContent = new Intl.DateTimeFormat(undefined, styles[code]).format(date);
      }
      el.title = date.toLocaleString();
    } catch (e) {}
  });
})();
"#;
