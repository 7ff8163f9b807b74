/*!

This is the long-form manual for `viedoc_provisioning` and `viedoc-admin`.

## Commands

* `create-sites` creates the study sites listed in a spreadsheet, and invites their site managers
* `create-users` invites users and gives them roles, at the study level or at a site
* `export-sites` writes the sites of the study to `export_studySites.csv`
* `export-users` writes the users of the study and their roles to `export_studyUsers.csv`
* `templates` writes empty import templates in the output directory
* `servers` lists the known Viedoc environments

Every command writes its log to `log.txt` in the output directory. Successive runs are
appended, separated by a line of dashes.

## Import files

Spreadsheets can be Excel workbooks (`xlsx`, `xlsm`, `xls`) or OpenDocument (`ods`), in which case
the first worksheet is read unless `--excel-worksheet-name` is given, or CSV files with a header row.
Blank rows are ignored. Rows are reported with their number in the spreadsheet, the header being
row 1.

### Sites

The following columns are required, in any order:

| column | notes |
|--|--|
| `siteCode` | unique in the file, and not already used in the study |
| `siteName` | unique in the file, and not already used in the study |
| `countryCode` | two letters, converted to upper case |
| `timeZoneId` | Windows time zone id, or its display name such as `(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna` |
| `expectedNumberOfSubjectsScreened` | optional value, integer |
| `expectedNumberOfSubjectsEnrolled` | optional value, integer |
| `maximumNumberOfSubjectsScreened` | optional value, integer |
| `isTrainingEnabled` | `True` / `False`, also `yes`, `no`, `1`, `0`, ... |
| `isProductionEnabled` | same as above |

An optional `roleSiteManager` column holds the email of a user to invite as site manager of
the new site.

The file is checked before any site is created: a missing column, a missing required value
or a duplicate code or name aborts the whole run.

### Users

The first five columns must be, in this order:

| column | notes |
|--|--|
| `email` | required |
| `roleOID` | a Role ID, or the name of a system role (`Study Manager`, `API Manager`, ...) or of a clinic role |
| `siteGuid` | optional |
| `siteName` | optional |
| `siteCode` | optional |

System roles apply to the whole study, except the site manager role which needs a site. All
the other roles need a site, found from the GUID first, then the code, then the name. Site codes
may be shared by several sites: in that case the name is used to tell them apart.

When a clinic role is given by its name, the platform answers with the list of the roles of
the study and the row is sent again once with the matching Role ID.

## Configuration

Settings are read from a JSON file given with `--config`. Arguments on the command line take
precedence.

```json
{
  "server": 1,
  "clientId": "...",
  "clientSecret": "...",
  "outputDirectory": "out"
}
```

* `server`: the number of the environment, see `viedoc-admin servers`. With `11` (custom),
  `tokenUrl` and `apiUrl` are required.
* `clientId`, `clientSecret`: the credentials of the API client, as configured in Viedoc Admin.
  The secret may also be given with the `VIEDOC_CLIENT_SECRET` environment variable.
* `outputDirectory`: where the log and the exports are written. Defaults to the current
  directory.
* `excelWorksheetName`: the worksheet to read in the import files.

*/
