/*!

This is the long-form manual for `stv_count` and `stvsim`.

## The count

The contest has exactly three candidates and a single seat. Every valid vote
is a first preference for one candidate, and the number of valid votes is
`round(electorate * turnout / 100)`. The first-preference shares are whole
percentages summing to 100, and the votes of each candidate are
`round(total * share / 100)`, rounding halves up. The rounded counts may drift
from the total by one vote, which is tolerated.

The quota is `floor(total / 2) + 1`:
- if a candidate reaches the quota in the first round, they are elected
  and the count stops.
- otherwise the candidate with the fewest votes is eliminated. Their votes
  are split between the two remaining candidates according to the transfer
  table, each part rounded separately. The candidate with more votes after
  the transfer is elected, even if they stay below the quota.

Ties are resolved by the order of the candidates, as configured by
`CountRules`:
- `elimination_tiebreak` (default `UseCandidateOrder`): among the candidates
  with the fewest votes, the first one is eliminated.
- `runoff_tiebreak` (default `ReverseCandidateOrder`): when the two remaining
  candidates finish level, the later one is elected.

## Editing the inputs

First-preference shares are edited one candidate at a time with
[`set_preference`](crate::set_preference). The edited value is clamped into
`[0, 100]` and the other candidates absorb the difference so the total stays
at 100. One candidate may be locked with [`toggle_lock`](crate::toggle_lock)
and then keeps their share. When a candidate is locked, the edited value is
capped at what the locked candidate leaves over.

Transfers are edited with [`set_transfer_split`](crate::set_transfer_split):
setting the share going to one recipient gives the rest to the other one.

Slider values may be numbers or text. Text is read like an integer: leading
whitespace and a sign are accepted, trailing characters are ignored, and
unreadable text counts as zero.

## Scenario files

`stvsim` reads an optional scenario file in JSON. Every part is optional and
falls back to the 2025 presidential election preset.

```text
{
  "outputSettings": {
    "contestName": "Irish Presidential Election 2025",
    "contestDate": "2025-10-24",
    "contestJurisdiction": "Ireland",
    "contestOffice": "President"
  },
  "candidates": [
    {"id": "connolly", "name": "Catherine Connolly", "shortName": "Connolly", "party": "Independent"},
    {"id": "gavin", "name": "Jim Gavin", "shortName": "Gavin", "party": "Fianna Fáil"},
    {"id": "humphreys", "name": "Heather Humphreys", "shortName": "Humphreys", "party": "Fine Gael"}
  ],
  "electorate": 3600000,
  "turnout": 60,
  "firstPreferences": {"connolly": 33, "gavin": 34, "humphreys": 33},
  "transferPreferences": {
    "connolly": {"gavin": 40, "humphreys": 60},
    "gavin": {"connolly": 45, "humphreys": 55},
    "humphreys": {"connolly": 50, "gavin": 50}
  },
  "odds": {"connolly": "34%", "gavin": "18%", "humphreys": "48%"},
  "rules": {
    "eliminationTiebreakMode": "useCandidateOrder",
    "runoffTiebreakMode": "reverseCandidateOrder"
  }
}
```

When `candidates` is given, the first preferences must name all three of
them. A candidate without a row in `transferPreferences` splits their votes
evenly.

Deviations from the RCVTab configuration format:
 - removed `cvrFileSources`: there are no ballots, only shares.
 - added `electorate`, `turnout`, `firstPreferences`, `transferPreferences`
   and `odds`.
 - the `rules` only control tie-breaks.

## Command line

The inputs of the scenario can be adjusted from the command line. The
adjustments are applied in this order, through the same operations as the
sliders:
 - `--turnout 55`
 - `--lock gavin` (repeatable, each one toggles the lock)
 - `--pref connolly=40` (repeatable)
 - `--transfer connolly:gavin=70` (repeatable)

`--odds` reads betting odds from a file in the shape of the market feed: an
array of events, the first of which lists `markets` with a `question` and a
numeric `clobProbability`. A failure to read the odds keeps the odds of the
scenario.

The summary of the count is written in JSON with `--out` (a path or
`stdout`), and compared with a reference summary with `--reference`.

 */
