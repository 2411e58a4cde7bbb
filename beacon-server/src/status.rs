//! Status summary: the endpoint line plus the hosts that pinged recently.

use beacon_core::recent::RecentSubjects;
use beacon_core::ServerEndpoint;

pub fn render(endpoint: &ServerEndpoint, recent: &RecentSubjects, clients: usize) -> String {
    let mut out = format!("{endpoint}, {clients} client(s)");
    for host in recent.iter() {
        out.push_str("\n    ");
        out.push_str(host);
    }
    out
}
