mod flows;
mod helpers;
mod properties;
mod scenarios;
mod theme;
